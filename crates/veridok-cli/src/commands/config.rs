//! Config command - manage the pipeline configuration file.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use veridok_core::VeridokConfig;

/// Top-level sections of [`VeridokConfig`], in display order.
const SECTIONS: &[&str] = &["ocr", "pdf", "anomaly", "models"];

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "ocr.noise_floor")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(),
        ConfigCommand::Init(init_args) => init_config(init_args),
        ConfigCommand::Get { key } => get_config(&key),
        ConfigCommand::Set { key, value } => set_config(&key, &value),
        ConfigCommand::Path => show_path(),
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("veridok")
        .join("config.json")
}

fn load_or_default() -> anyhow::Result<VeridokConfig> {
    let config_path = default_config_path();
    if config_path.exists() {
        Ok(VeridokConfig::from_file(&config_path)?)
    } else {
        Ok(VeridokConfig::default())
    }
}

fn show_config() -> anyhow::Result<()> {
    let config_path = default_config_path();
    if !config_path.exists() {
        println!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }

    let json = serde_json::to_value(load_or_default()?)?;
    for section in SECTIONS {
        println!("{}", style(format!("[{}]", section)).cyan().bold());
        if let Some(Value::Object(entries)) = json.get(*section) {
            for (name, value) in entries {
                println!("  {} = {}", name, value);
            }
        }
        println!();
    }

    Ok(())
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(default_config_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = VeridokConfig::default();
    config.save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(key: &str) -> anyhow::Result<()> {
    let json = serde_json::to_value(load_or_default()?)?;
    let value = lookup(&json, key)?;
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn set_config(key: &str, value: &str) -> anyhow::Result<()> {
    let config_path = default_config_path();
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let parsed_value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let mut json = serde_json::to_value(load_or_default()?)?;
    apply(&mut json, key, parsed_value.clone())?;

    // Round-trip through the typed config so a wrongly-typed value is
    // rejected before it lands on disk.
    let config: VeridokConfig = serde_json::from_value(json).map_err(|e| {
        anyhow::anyhow!("Value {} is not valid for key '{}': {}", parsed_value, key, e)
    })?;
    config.save(&config_path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed_value)?
    );

    Ok(())
}

fn show_path() -> anyhow::Result<()> {
    let config_path = default_config_path();

    println!("Configuration file: {}", config_path.display());

    if config_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'veridok config init' to create a configuration file.");
    }

    Ok(())
}

/// Resolve a dotted key against the config JSON, validating the
/// section name so typos get an actionable error.
fn lookup<'a>(root: &'a Value, key: &str) -> anyhow::Result<&'a Value> {
    let section = key.split('.').next().unwrap_or(key);
    if !SECTIONS.contains(&section) {
        anyhow::bail!(
            "Unknown configuration section '{}'. Valid sections: {}",
            section,
            SECTIONS.join(", ")
        );
    }
    let pointer = format!("/{}", key.replace('.', "/"));
    root.pointer(&pointer)
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
}

/// Write a value at a dotted key, requiring that the key already
/// exists in the config shape.
fn apply(root: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    // Validate the full path first so set never invents new keys.
    lookup(root, key)?;
    let pointer = format!("/{}", key.replace('.', "/"));
    if let Some(slot) = root.pointer_mut(&pointer) {
        *slot = value;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_json() -> Value {
        serde_json::to_value(VeridokConfig::default()).unwrap()
    }

    #[test]
    fn test_lookup_known_key() {
        let json = config_json();
        let value = lookup(&json, "pdf.max_ocr_pages").unwrap();
        assert_eq!(value.as_u64(), Some(5));
    }

    #[test]
    fn test_lookup_rejects_unknown_section() {
        let json = config_json();
        let err = lookup(&json, "engine.threads").unwrap_err();
        assert!(err.to_string().contains("Valid sections"));
    }

    #[test]
    fn test_lookup_rejects_unknown_leaf() {
        let json = config_json();
        assert!(lookup(&json, "ocr.does_not_exist").is_err());
    }

    #[test]
    fn test_apply_overwrites_existing_key() {
        let mut json = config_json();
        apply(&mut json, "ocr.worker_threads", Value::from(4)).unwrap();
        let config: VeridokConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.ocr.worker_threads, 4);
    }

    #[test]
    fn test_apply_never_invents_keys() {
        let mut json = config_json();
        assert!(apply(&mut json, "ocr.brand_new_knob", Value::from(1)).is_err());
        let config: VeridokConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.ocr.worker_threads, 0);
    }
}
