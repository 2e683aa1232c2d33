//! Core library for receipt OCR text processing.
//!
//! This crate provides:
//! - Line segmentation of raw OCR transcripts
//! - Rule-based field extraction (merchant name, transaction date, total amount)
//! - Receipt record models with category and currency defaults
//! - JSON configuration for the extraction heuristics

pub mod error;
pub mod models;
pub mod receipt;

pub use error::{RcptError, Result};
pub use models::config::{ExtractionConfig, RcptConfig, ReceiptDefaults};
pub use models::receipt::{CategorySpending, ParseResult, Receipt, ReceiptCategory};
pub use receipt::{
    AmountStrategy, ExtractionResult, ReceiptParser, ReceiptText, ReceiptTextParser,
};
