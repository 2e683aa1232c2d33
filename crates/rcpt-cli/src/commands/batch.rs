//! Batch processing command for multiple receipt transcripts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use rcpt_core::models::receipt::{spending_by_category, total_spending};
use rcpt_core::receipt::{ReceiptParser, ReceiptTextParser};
use rcpt_core::{ExtractionResult, Receipt, ReceiptDefaults};

use super::load_config;
use super::parse::{format_receipt, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching `.txt` transcripts
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of files processed concurrently
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    outcome: anyhow::Result<(Receipt, ExtractionResult)>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            ext.eq_ignore_ascii_case("txt")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let parser = Arc::new(ReceiptTextParser::from_config(&config.extraction));
    let defaults = Arc::new(config.receipt.clone());

    let mut pending = stream::iter(files)
        .map(|path| {
            let parser = Arc::clone(&parser);
            let defaults = Arc::clone(&defaults);
            async move {
                let file_start = Instant::now();
                let outcome = process_file(&path, parser, defaults).await;
                FileResult {
                    path,
                    outcome,
                    processing_time_ms: file_start.elapsed().as_millis() as u64,
                }
            }
        })
        .buffered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some(result) = pending.next().await {
        if let Err(e) = &result.outcome {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), e);
            } else {
                error!("Failed to process {}: {}", result.path.display(), e);
                pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), e);
            }
        }
        pb.inc(1);
        results.push(result);
    }

    pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            if let Ok((receipt, extraction)) = &result.outcome {
                write_output(output_dir, &result.path, receipt, extraction, args.format)?;
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let receipts: Vec<Receipt> = results
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok())
        .map(|(receipt, _)| receipt.clone())
        .collect();
    let failed: Vec<&FileResult> = results.iter().filter(|r| r.outcome.is_err()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(receipts.len()).green(),
        style(failed.len()).red()
    );

    if !receipts.is_empty() {
        println!();
        println!("{}", style("Totals by category:").bold());
        for spending in spending_by_category(&receipts) {
            println!("  {:<15} {}", spending.category.display_name(), spending.total);
        }
        println!("  {:<15} {}", "All", total_spending(&receipts));
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Err(e) = &result.outcome {
                println!("  - {}: {}", result.path.display(), e);
            }
        }
    }

    Ok(())
}

async fn process_file(
    path: &Path,
    parser: Arc<ReceiptTextParser>,
    defaults: Arc<ReceiptDefaults>,
) -> anyhow::Result<(Receipt, ExtractionResult)> {
    let text = tokio::fs::read_to_string(path).await?;
    if text.trim().is_empty() {
        anyhow::bail!("No text found in input");
    }

    info!("Parsing {}", path.display());

    let extraction = tokio::task::spawn_blocking(move || parser.extract(&text)).await?;
    for warning in &extraction.warnings {
        debug!("{}: {}", path.display(), warning);
    }

    let receipt = Receipt::from_extraction(&extraction, &defaults);
    Ok((receipt, extraction))
}

fn write_output(
    output_dir: &Path,
    source: &Path,
    receipt: &Receipt,
    extraction: &ExtractionResult,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let output_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("receipt");
    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

    let content = format_receipt(receipt, &extraction.warnings, format)?;
    fs::write(&output_path, content)?;
    debug!("Wrote output to {}", output_path.display());

    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "merchant_name",
        "date",
        "total_amount",
        "currency",
        "amount_strategy",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.outcome {
            Ok((receipt, extraction)) => {
                wtr.write_record([
                    filename,
                    "success",
                    receipt.merchant_name.as_deref().unwrap_or_default(),
                    receipt.date.as_deref().unwrap_or_default(),
                    &receipt.total_amount.map(|a| a.to_string()).unwrap_or_default(),
                    &receipt.currency,
                    extraction.amount_strategy.map(|s| s.as_str()).unwrap_or_default(),
                    &result.processing_time_ms.to_string(),
                    "",
                ])?;
            }
            Err(e) => {
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &result.processing_time_ms.to_string(),
                    &e.to_string(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
