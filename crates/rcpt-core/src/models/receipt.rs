//! Receipt data models.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::config::ReceiptDefaults;
use crate::receipt::rules::amounts::parse_amount;
use crate::receipt::rules::dates::calendar_date;
use crate::receipt::ExtractionResult;

/// Fields extracted from one OCR transcript.
///
/// Every field is the substring found in the transcript. The merchant name
/// may be uppercased (known store) or truncated; the amount is never
/// reformatted, use [`ParseResult::amount_value`] to get a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub merchant_name: Option<String>,
    pub date: Option<String>,
    pub total_amount: Option<String>,
}

impl ParseResult {
    /// True when no field was found.
    pub fn is_empty(&self) -> bool {
        self.merchant_name.is_none() && self.date.is_none() && self.total_amount.is_none()
    }

    /// Total amount as a number, if present and parseable.
    pub fn amount_value(&self) -> Option<Decimal> {
        self.total_amount.as_deref().and_then(parse_amount)
    }
}

/// Spending categories a receipt can be filed under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptCategory {
    Groceries,
    Dining,
    Shopping,
    Transportation,
    Healthcare,
    Entertainment,
    Utilities,
    #[default]
    Other,
}

impl ReceiptCategory {
    /// All categories in display order.
    pub const ALL: [ReceiptCategory; 8] = [
        Self::Groceries,
        Self::Dining,
        Self::Shopping,
        Self::Transportation,
        Self::Healthcare,
        Self::Entertainment,
        Self::Utilities,
        Self::Other,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Groceries => "Groceries",
            Self::Dining => "Dining",
            Self::Shopping => "Shopping",
            Self::Transportation => "Transportation",
            Self::Healthcare => "Healthcare",
            Self::Entertainment => "Entertainment",
            Self::Utilities => "Utilities",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive lookup; unknown names map to `Other`.
    pub fn from_display_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.display_name().eq_ignore_ascii_case(name))
            .unwrap_or(Self::Other)
    }

    pub fn all_display_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.display_name()).collect()
    }
}

impl fmt::Display for ReceiptCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A receipt record as handed to storage or display layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,

    /// Date as printed on the receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,

    /// ISO currency code.
    pub currency: String,

    pub category: ReceiptCategory,

    /// Full OCR transcript the fields were extracted from.
    pub raw_text: String,

    pub captured_at: DateTime<Utc>,
}

impl Receipt {
    /// Build a record from an extraction, filling gaps from `defaults`.
    pub fn from_extraction(extraction: &ExtractionResult, defaults: &ReceiptDefaults) -> Self {
        let currency = extraction
            .currency
            .clone()
            .unwrap_or_else(|| defaults.default_currency.clone());

        debug!(
            "Building receipt record (merchant: {:?}, amount: {:?} {})",
            extraction.result.merchant_name, extraction.amount, currency
        );

        Self {
            merchant_name: extraction.result.merchant_name.clone(),
            date: extraction.result.date.clone(),
            total_amount: extraction.amount,
            currency,
            category: defaults.default_category,
            raw_text: extraction.raw_text.clone(),
            captured_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: ReceiptCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Best-effort calendar interpretation of the printed date.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(calendar_date)
    }
}

/// Total spent in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category: ReceiptCategory,
    pub total: Decimal,
}

/// Sum of all receipt totals; receipts without an amount count as zero.
pub fn total_spending(receipts: &[Receipt]) -> Decimal {
    receipts.iter().filter_map(|r| r.total_amount).sum()
}

/// Totals per category, in [`ReceiptCategory::ALL`] order, omitting
/// categories without receipts.
pub fn spending_by_category(receipts: &[Receipt]) -> Vec<CategorySpending> {
    ReceiptCategory::ALL
        .into_iter()
        .filter_map(|category| {
            let mut in_category = receipts.iter().filter(|r| r.category == category).peekable();
            in_category.peek()?;
            let total = in_category.filter_map(|r| r.total_amount).sum();
            Some(CategorySpending { category, total })
        })
        .collect()
}
