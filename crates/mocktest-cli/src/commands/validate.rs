//! The `mocktest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use mocktest_core::config::load_config_from;
use mocktest_core::parser::{load_bank, validate_bank};

pub fn execute(bank_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank = load_bank(&bank_path, config.marks())?;

    println!("Bank: {} ({} questions)", bank.name, bank.len());

    let warnings = validate_bank(&bank);
    for w in &warnings {
        let prefix = w
            .question
            .map(|i| format!("  [Q{}]", i + 1))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Bank is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
