//! Rule-based field extractors for receipts.

pub mod amounts;
pub mod dates;
pub mod merchant;
pub mod patterns;

pub use amounts::{normalize_amount, parse_amount, AmountExtractor, AmountStrategy, Total};
pub use dates::{calendar_date, DateExtractor};
pub use merchant::{LineRejection, MerchantExtractor};

use super::text::ReceiptText;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the winning value for the field.
    fn extract(&self, text: &ReceiptText<'_>) -> Option<Self::Output>;

    /// Extract every candidate, in precedence order.
    fn extract_all(&self, text: &ReceiptText<'_>) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Byte span in the transcript.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
    /// Name of the rule that produced the match.
    pub rule: &'static str,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
            rule: "",
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn with_rule(mut self, rule: &'static str) -> Self {
        self.rule = rule;
        self
    }
}
