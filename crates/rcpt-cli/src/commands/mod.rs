//! Subcommands of the `rcpt` binary.

pub mod batch;
pub mod config;
pub mod parse;

use std::path::{Path, PathBuf};

use tracing::debug;

use rcpt_core::RcptConfig;

/// Per-user configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Load the configuration named on the command line, else the per-user
/// file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RcptConfig> {
    if let Some(path) = config_path {
        return Ok(RcptConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        Ok(RcptConfig::from_file(&path)?)
    } else {
        debug!("No config file at {}, using defaults", path.display());
        Ok(RcptConfig::default())
    }
}
