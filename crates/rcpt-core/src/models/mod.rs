//! Data models: parse results, receipt records and configuration.

pub mod config;
pub mod receipt;
