//! Config Validation Binary
//!
//! Checks the bot's YAML config before a scheduled run:
//! - team name folds to a usable key
//! - post budget and season length are sane
//! - every page URL is present and objective keys are unique

use std::path::PathBuf;

use anyhow::{Context, Result};

use standings_bot::config::{load_config, validate_config};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("STANDINGS_BOT_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yml"));

    println!("=== Bot Configuration Validator ===");
    if !path.exists() {
        println!("No config at {:?}, checking built-in defaults", path);
    }

    let config = load_config(&path).with_context(|| format!("Failed to load {:?}", path))?;
    let report = validate_config(&config);

    if report.errors.is_empty() && report.warnings.is_empty() {
        println!(
            "✓ Config is valid ({} objectives, publisher {:?})",
            config.objectives.len(),
            config.publisher
        );
        return Ok(());
    }

    if !report.errors.is_empty() {
        println!("\n❌ ERRORS (must fix):");
        for error in &report.errors {
            println!("  - {}", error);
        }
    }

    if !report.warnings.is_empty() {
        println!("\n⚠️  WARNINGS:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    if !report.is_ok() {
        std::process::exit(1);
    }

    Ok(())
}
