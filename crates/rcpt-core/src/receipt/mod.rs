//! Receipt field extraction module.

mod parser;
pub mod rules;
mod text;

pub use parser::{ExtractionResult, ReceiptTextParser};
pub use rules::AmountStrategy;
pub use text::{ReceiptLine, ReceiptText};

use crate::models::receipt::ParseResult;

/// Trait for receipt text parsers.
///
/// Implementations are total: they never fail, absent fields are `None`.
pub trait ReceiptParser {
    /// Extract merchant, date and total from an OCR transcript.
    fn parse(&self, text: &str) -> ParseResult;

    /// Like [`ReceiptParser::parse`], with confidences, amount value and warnings.
    fn extract(&self, text: &str) -> ExtractionResult;
}
