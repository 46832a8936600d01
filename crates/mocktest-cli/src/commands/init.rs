//! The `mocktest init` command.

use std::path::Path;

use anyhow::Result;

use mocktest_core::model::QuestionBank;
use mocktest_core::parser::save_bank;

pub fn execute() -> Result<()> {
    // Create mocktest.toml
    if Path::new("mocktest.toml").exists() {
        println!("mocktest.toml already exists, skipping.");
    } else {
        std::fs::write("mocktest.toml", SAMPLE_CONFIG)?;
        println!("Created mocktest.toml");
    }

    // Create sample bank
    let sample_path = Path::new("banks/sample.json");
    if sample_path.exists() {
        println!("banks/sample.json already exists, skipping.");
    } else {
        save_bank(&QuestionBank::sample(), sample_path)?;
        println!("Created banks/sample.json");
    }

    println!("\nNext steps:");
    println!("  1. Add questions: mocktest bank add --file banks/sample.json --question ... --option ... --correct 1");
    println!("  2. Run: mocktest validate --bank banks/sample.json");
    println!("  3. Run: mocktest take --bank banks/sample.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# mocktest configuration

# Marks for a correct answer and for a wrong answer. Skipped questions score 0.
# Applied to questions that do not carry their own marks.
marks_correct = 2.0
marks_wrong = -0.66

# Bank used by `mocktest take` when --bank is not given.
default_bank = "banks/sample.json"

# Where attempt reports are written.
report_dir = "./mocktest-results"
"#;
