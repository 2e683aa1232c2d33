//! Rule-based receipt text parser.

use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::config::{AmountBounds, ExtractionConfig, LabelPrecedence};
use crate::models::receipt::ParseResult;

use super::rules::{
    AmountExtractor, AmountStrategy, DateExtractor, ExtractionMatch, FieldExtractor,
    MerchantExtractor, Total,
};
use super::text::ReceiptText;
use super::ReceiptParser;

/// Detailed outcome of one extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// The three extracted fields.
    pub result: ParseResult,
    /// Total amount as a number.
    pub amount: Option<Decimal>,
    /// ISO code of the currency printed next to the total.
    pub currency: Option<String>,
    /// Which strategy produced the total.
    pub amount_strategy: Option<AmountStrategy>,
    /// Confidence per found field.
    pub field_confidence: BTreeMap<String, f32>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Raw transcript.
    pub raw_text: String,
    /// Number of non-blank lines.
    pub line_count: usize,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Mean confidence over the three fields; missing fields count as zero.
    pub fn confidence(&self) -> f32 {
        self.field_confidence.values().sum::<f32>() / 3.0
    }
}

struct Fields {
    merchant: Option<ExtractionMatch<String>>,
    date: Option<ExtractionMatch<String>>,
    total: Option<ExtractionMatch<Total>>,
}

impl Fields {
    fn to_parse_result(&self) -> ParseResult {
        ParseResult {
            merchant_name: self.merchant.as_ref().map(|m| m.value.clone()),
            date: self.date.as_ref().map(|m| m.value.clone()),
            total_amount: self.total.as_ref().map(|m| m.source.clone()),
        }
    }
}

/// Receipt parser built from the merchant, date and amount extractors.
///
/// Holds only immutable settings, so one instance can be shared across
/// threads.
pub struct ReceiptTextParser {
    merchant: MerchantExtractor,
    dates: DateExtractor,
    amounts: AmountExtractor,
}

impl ReceiptTextParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Create a parser from extraction settings.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            merchant: MerchantExtractor::from_config(config),
            dates: DateExtractor::new(),
            amounts: AmountExtractor::new()
                .with_keywords(&config.total_keywords)
                .with_precedence(config.label_precedence)
                .with_bounds(config.amount_bounds),
        }
    }

    /// Set the number of leading lines scanned for the merchant name.
    pub fn with_candidate_lines(mut self, lines: usize) -> Self {
        self.merchant = self.merchant.with_candidate_lines(lines);
        self
    }

    /// Set the character length range a merchant candidate line must fall in.
    pub fn with_merchant_line_length(mut self, min: usize, max: usize) -> Self {
        self.merchant = self.merchant.with_line_length(min, max);
        self
    }

    /// Set the merchant name truncation length.
    pub fn with_merchant_max_length(mut self, max_length: usize) -> Self {
        self.merchant = self.merchant.with_max_length(max_length);
        self
    }

    /// Set the plausibility range for totals (`None` disables it).
    pub fn with_amount_bounds(mut self, bounds: Option<AmountBounds>) -> Self {
        self.amounts = self.amounts.with_bounds(bounds);
        self
    }

    /// Set which labeled amount wins.
    pub fn with_label_precedence(mut self, precedence: LabelPrecedence) -> Self {
        self.amounts = self.amounts.with_precedence(precedence);
        self
    }

    /// Replace the total label keywords.
    pub fn with_total_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.amounts = self.amounts.with_keywords(keywords);
        self
    }

    /// Enable or disable the address, digit and boilerplate line filters.
    pub fn with_strict_merchant_filters(mut self, strict: bool) -> Self {
        self.merchant = self.merchant.with_strict_filters(strict);
        self
    }

    /// Enable or disable the known-store lookup.
    pub fn with_store_allowlist(mut self, enabled: bool) -> Self {
        self.merchant = self.merchant.with_allowlist(enabled);
        self
    }

    fn fields(&self, text: &ReceiptText<'_>) -> Fields {
        Fields {
            merchant: self.merchant.extract(text),
            date: self.dates.extract(text),
            total: self.amounts.extract(text),
        }
    }
}

impl Default for ReceiptTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptParser for ReceiptTextParser {
    fn parse(&self, text: &str) -> ParseResult {
        self.fields(&ReceiptText::new(text)).to_parse_result()
    }

    fn extract(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let receipt_text = ReceiptText::new(text);
        let fields = self.fields(&receipt_text);

        let mut warnings = Vec::new();
        let mut field_confidence = BTreeMap::new();

        match &fields.merchant {
            Some(m) => {
                field_confidence.insert("merchant_name".to_string(), m.confidence);
            }
            None => warnings.push("Could not extract merchant name".to_string()),
        }

        match &fields.date {
            Some(m) => {
                field_confidence.insert("date".to_string(), m.confidence);
            }
            None => warnings.push("Could not extract date".to_string()),
        }

        match &fields.total {
            Some(m) => {
                field_confidence.insert("total_amount".to_string(), m.confidence);
                if m.value.strategy == AmountStrategy::Largest {
                    warnings.push(format!(
                        "No labeled total found, using largest amount {}",
                        m.source
                    ));
                }
            }
            None => warnings.push("Could not extract total amount".to_string()),
        }

        let total = fields.total.as_ref().map(|m| &m.value);

        ExtractionResult {
            result: fields.to_parse_result(),
            amount: total.map(|t| t.amount),
            currency: total.and_then(|t| t.currency).map(str::to_string),
            amount_strategy: total.map(|t| t.strategy),
            field_confidence,
            warnings,
            raw_text: text.to_string(),
            line_count: receipt_text.lines().len(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}
