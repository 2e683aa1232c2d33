//! Parse command - extract fields from a single receipt transcript.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use rcpt_core::receipt::{ReceiptParser, ReceiptTextParser};
use rcpt_core::{ExtractionResult, Receipt, ReceiptCategory};

use super::load_config;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Transcript file, or `-` to read stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Category to file the receipt under (e.g. "Groceries")
    #[arg(long)]
    category: Option<String>,

    /// Currency code overriding the detected one
    #[arg(long)]
    currency: Option<String>,

    /// Show extraction confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for per-file outputs.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let text = read_input(&args.input).await?;
    if text.trim().is_empty() {
        anyhow::bail!("No text found in input");
    }

    info!("Parsing {} characters from {}", text.len(), args.input.display());

    let parser = ReceiptTextParser::from_config(&config.extraction);
    let extraction = parser.extract(&text);

    for warning in &extraction.warnings {
        warn!("{}", warning);
    }

    let mut receipt = Receipt::from_extraction(&extraction, &config.receipt);
    if let Some(name) = &args.category {
        receipt = receipt.with_category(ReceiptCategory::from_display_name(name));
    }
    if let Some(currency) = &args.currency {
        receipt = receipt.with_currency(currency.trim().to_uppercase());
    }

    let output = format_receipt(&receipt, &extraction.warnings, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        print_confidence(&extraction);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

async fn read_input(input: &PathBuf) -> anyhow::Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    Ok(tokio::fs::read_to_string(input).await?)
}

fn print_confidence(extraction: &ExtractionResult) {
    println!();
    println!(
        "{} Extraction confidence: {:.1}%",
        style("ℹ").blue(),
        extraction.confidence() * 100.0
    );
    for (field, confidence) in &extraction.field_confidence {
        println!("   {}: {:.1}%", field, confidence * 100.0);
    }
    if let Some(strategy) = extraction.amount_strategy {
        println!("{} Amount strategy: {}", style("ℹ").blue(), strategy.as_str());
    }
    println!(
        "{} Processing time: {}ms",
        style("ℹ").blue(),
        extraction.processing_time_ms
    );
}

pub fn format_receipt(
    receipt: &Receipt,
    warnings: &[String],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(receipt)?),
        OutputFormat::Csv => format_csv(receipt),
        OutputFormat::Text => Ok(format_text(receipt, warnings)),
    }
}

fn format_csv(receipt: &Receipt) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "merchant_name",
        "date",
        "total_amount",
        "currency",
        "category",
        "captured_at",
    ])?;

    wtr.write_record([
        receipt.merchant_name.as_deref().unwrap_or_default(),
        receipt.date.as_deref().unwrap_or_default(),
        &receipt.total_amount.map(|a| a.to_string()).unwrap_or_default(),
        &receipt.currency,
        receipt.category.display_name(),
        &receipt.captured_at.to_rfc3339(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(receipt: &Receipt, warnings: &[String]) -> String {
    let mut output = String::new();
    let missing = "(not found)";

    output.push_str(&format!(
        "Merchant: {}\n",
        receipt.merchant_name.as_deref().unwrap_or(missing)
    ));
    output.push_str(&format!("Date:     {}\n", receipt.date.as_deref().unwrap_or(missing)));
    match receipt.total_amount {
        Some(amount) => output.push_str(&format!("Total:    {} {}\n", amount, receipt.currency)),
        None => output.push_str(&format!("Total:    {}\n", missing)),
    }
    output.push_str(&format!("Category: {}\n", receipt.category));

    if let Some(date) = receipt.calendar_date() {
        output.push_str(&format!("Calendar: {}\n", date.format("%Y-%m-%d")));
    }

    if !warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
