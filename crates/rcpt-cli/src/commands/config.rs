//! `rcpt config`: inspect and edit the settings file.
//!
//! Keys are dotted paths into the JSON form of [`RcptConfig`], e.g.
//! `extraction.merchant_max_length` or `receipt.default_currency`.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;
use tracing::debug;

use rcpt_core::RcptConfig;

use super::default_config_path;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as JSON
    Show,

    /// Write a settings file with the defaults
    Init {
        /// Write here instead of the configured path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one setting
    Get {
        /// Dotted key, e.g. "extraction.merchant_max_length"
        key: String,
    },

    /// Change one setting and save the file
    Set {
        /// Dotted key
        key: String,
        /// JSON value; anything that is not JSON is stored as a string
        value: String,
    },

    /// Print where the settings file lives
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => show(&path),
        ConfigCommand::Init { output, force } => init(output.as_deref().unwrap_or(&path), force),
        ConfigCommand::Get { key } => get(&path, &key),
        ConfigCommand::Set { key, value } => set(&path, &key, &value),
        ConfigCommand::Path => show_path(&path),
    }
}

fn load_or_default(path: &Path) -> anyhow::Result<RcptConfig> {
    if path.exists() {
        Ok(RcptConfig::from_file(path)?)
    } else {
        debug!("No config file at {}, using defaults", path.display());
        Ok(RcptConfig::default())
    }
}

fn save(config: &RcptConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    Ok(())
}

fn show(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        eprintln!("{} No config file found, showing defaults.", style("ℹ").blue());
    }

    let config = load_or_default(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    save(&RcptConfig::default(), path)?;
    println!("{} Created configuration file at {}", style("✓").green(), path.display());
    Ok(())
}

fn get(path: &Path, key: &str) -> anyhow::Result<()> {
    let json = serde_json::to_value(load_or_default(path)?)?;
    println!("{}", serde_json::to_string_pretty(lookup(&json, key)?)?);
    Ok(())
}

fn set(path: &Path, key: &str, raw: &str) -> anyhow::Result<()> {
    let value = parse_value(raw);
    let config = with_value(load_or_default(path)?, key, value.clone())?;

    save(&config, path)?;
    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'rcpt config init' to create a configuration file.");
    }
    Ok(())
}

/// JSON if it parses, else the raw text as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn lookup<'a>(json: &'a Value, key: &str) -> anyhow::Result<&'a Value> {
    key.split('.').try_fold(json, |node, part| {
        node.get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
    })
}

/// Replace an existing key and re-validate the whole config.
fn with_value(config: RcptConfig, key: &str, value: Value) -> anyhow::Result<RcptConfig> {
    let mut json = serde_json::to_value(&config)?;

    let (parent, field) = key.rsplit_once('.').unwrap_or(("", key));
    let node = if parent.is_empty() {
        &mut json
    } else {
        parent.split('.').try_fold(&mut json, |node, part| {
            node.get_mut(part)
                .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
        })?
    };

    match node.as_object_mut() {
        Some(obj) if obj.contains_key(field) => {
            obj.insert(field.to_string(), value);
        }
        Some(_) => anyhow::bail!("Configuration key not found: {}", key),
        None => anyhow::bail!("Cannot set value at non-object path: {}", key),
    }

    let config: RcptConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
    config.validate()?;
    Ok(config)
}
