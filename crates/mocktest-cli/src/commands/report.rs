//! The `mocktest report` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use mocktest_core::report::AttemptReport;
use mocktest_report::html::generate_html;

pub fn execute(input: PathBuf, format: String, output: Option<PathBuf>) -> Result<()> {
    let report = AttemptReport::load_json(&input)?;

    let rendered = match format.as_str() {
        "markdown" | "md" => report.to_markdown(),
        "html" => generate_html(&report),
        other => anyhow::bail!("unknown format '{other}'. Use: markdown, html"),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Report written to: {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
