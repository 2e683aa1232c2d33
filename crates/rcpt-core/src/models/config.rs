//! Configuration structures for receipt extraction.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RcptError, Result};
use crate::models::receipt::ReceiptCategory;
use crate::receipt::rules::patterns::DEFAULT_TOTAL_KEYWORDS;

/// Main configuration for the rcpt pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// Field extraction heuristics.
    pub extraction: ExtractionConfig,

    /// Defaults applied when building receipt records.
    pub receipt: ReceiptDefaults,
}

/// Which labeled line wins when several carry an amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPrecedence {
    /// The first labeled line from the top of the receipt.
    First,
    /// The last labeled line; grand totals usually follow subtotal and tax lines.
    #[default]
    Last,
}

/// Inclusive range an extracted total must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountBounds {
    pub min: Decimal,
    pub max: Decimal,
}

impl AmountBounds {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for AmountBounds {
    fn default() -> Self {
        Self {
            min: Decimal::ONE,
            max: Decimal::from(100_000),
        }
    }
}

/// Receipt field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Check the known-store allowlist before scanning lines.
    pub use_store_allowlist: bool,

    /// Number of leading lines considered for the merchant name.
    pub merchant_candidate_lines: usize,

    /// Shortest line (in characters) accepted as a merchant name.
    pub merchant_min_line_length: usize,

    /// Longest line (in characters) accepted as a merchant name.
    pub merchant_max_line_length: usize,

    /// Returned merchant names are truncated to this many characters.
    pub merchant_max_length: usize,

    /// Also reject address, digit-heavy and boilerplate lines.
    pub strict_merchant_filters: bool,

    /// Fall back to the first usable line when every candidate is rejected.
    pub merchant_fallback_first_line: bool,

    /// Label keywords anchoring the total amount (matched case-insensitively).
    pub total_keywords: Vec<String>,

    /// Which labeled amount wins.
    pub label_precedence: LabelPrecedence,

    /// Plausibility range for totals (`None` disables the check).
    pub amount_bounds: Option<AmountBounds>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            use_store_allowlist: true,
            merchant_candidate_lines: 5,
            merchant_min_line_length: 3,
            merchant_max_line_length: 40,
            merchant_max_length: 30,
            strict_merchant_filters: true,
            merchant_fallback_first_line: true,
            total_keywords: DEFAULT_TOTAL_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            label_precedence: LabelPrecedence::Last,
            amount_bounds: Some(AmountBounds::default()),
        }
    }
}

/// Defaults for receipt records built from parse results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptDefaults {
    /// Currency code used when none is detected on the receipt.
    pub default_currency: String,

    /// Category assigned before the user picks one.
    pub default_category: ReceiptCategory,
}

impl Default for ReceiptDefaults {
    fn default() -> Self {
        Self {
            default_currency: "MAD".to_string(),
            default_category: ReceiptCategory::Other,
        }
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Check values that would make the heuristics degenerate.
    pub fn validate(&self) -> Result<()> {
        let extraction = &self.extraction;

        if extraction.merchant_candidate_lines == 0 {
            return Err(RcptError::Config(
                "extraction.merchant_candidate_lines must be at least 1".to_string(),
            ));
        }
        if extraction.merchant_max_length == 0 {
            return Err(RcptError::Config(
                "extraction.merchant_max_length must be at least 1".to_string(),
            ));
        }
        if extraction.merchant_min_line_length > extraction.merchant_max_line_length {
            return Err(RcptError::Config(format!(
                "extraction.merchant_min_line_length ({}) exceeds merchant_max_line_length ({})",
                extraction.merchant_min_line_length, extraction.merchant_max_line_length
            )));
        }
        if let Some(bounds) = extraction.amount_bounds {
            if bounds.min > bounds.max {
                return Err(RcptError::Config(format!(
                    "extraction.amount_bounds min ({}) exceeds max ({})",
                    bounds.min, bounds.max
                )));
            }
        }
        if self.receipt.default_currency.trim().is_empty() {
            return Err(RcptError::Config(
                "receipt.default_currency must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RcptConfig::default();

        assert_eq!(config.extraction.merchant_candidate_lines, 5);
        assert_eq!(config.extraction.merchant_max_length, 30);
        assert_eq!(config.extraction.label_precedence, LabelPrecedence::Last);
        assert_eq!(config.receipt.default_currency, "MAD");
        assert_eq!(config.receipt.default_category, ReceiptCategory::Other);
        assert!(config.extraction.total_keywords.iter().any(|k| k == "total"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "extraction": { "merchant_max_length": 50, "label_precedence": "first" } }"#;
        let config: RcptConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.extraction.merchant_max_length, 50);
        assert_eq!(config.extraction.label_precedence, LabelPrecedence::First);
        assert_eq!(config.extraction.merchant_candidate_lines, 5);
        assert_eq!(config.extraction.amount_bounds, Some(AmountBounds::default()));
    }

    #[test]
    fn test_bounds_can_be_disabled() {
        let json = r#"{ "extraction": { "amount_bounds": null } }"#;
        let config: RcptConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.extraction.amount_bounds, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = RcptConfig::default();
        config.extraction.merchant_candidate_lines = 8;
        config.receipt.default_currency = "EUR".to_string();
        config.save(&path).unwrap();

        let loaded = RcptConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = RcptConfig::default();
        config.extraction.amount_bounds =
            Some(AmountBounds::new(Decimal::from(10), Decimal::ONE));

        assert!(matches!(config.validate(), Err(RcptError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_candidate_lines() {
        let mut config = RcptConfig::default();
        config.extraction.merchant_candidate_lines = 0;

        assert!(matches!(config.validate(), Err(RcptError::Config(_))));
    }

    #[test]
    fn test_bounds_contains_is_inclusive() {
        let bounds = AmountBounds::default();

        assert!(bounds.contains(Decimal::ONE));
        assert!(bounds.contains(Decimal::from(100_000)));
        assert!(!bounds.contains(Decimal::new(99, 2)));
    }
}
