//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use mocktest_core::report::AttemptReport;
use mocktest_core::scoring::Outcome;
use mocktest_core::timing::format_clock;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// One horizontal bar: label, fill fraction in `0.0..=1.0`, value text.
struct Bar {
    label: String,
    fraction: f64,
    text: String,
    color: &'static str,
}

/// Generate an HTML report from an attempt report.
pub fn generate_html(report: &AttemptReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>mocktest results: {}</title>\n",
        html_escape(&report.bank.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Test results</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Test: <strong>{}</strong> | {} questions | {}</p>\n",
        html_escape(&report.bank.name),
        report.bank.question_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    let score = &report.score;
    let summary = &report.summary;
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Score</th><th>Correct</th><th>Wrong</th><th>Skipped</th><th>Accuracy</th><th>Time</th><th>Avg / question</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    html.push_str(&format!(
        "<tr><td>{} / {:.2}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td><td>{}</td><td>{:.1}s</td></tr>\n",
        score.total_display(),
        score.max_score,
        score.correct_count,
        score.wrong_count,
        score.skipped_count,
        summary.accuracy_pct,
        format_clock(summary.elapsed_seconds),
        summary.average_seconds,
    ));
    html.push_str("</tbody></table>\n");

    if let (Some(fastest), Some(slowest)) = (summary.fastest, summary.slowest) {
        html.push_str(&format!(
            "<p class=\"meta\">Fastest: question {} ({}s) | Slowest: question {} ({}s)</p>\n",
            fastest.index + 1,
            fastest.seconds,
            slowest.index + 1,
            slowest.seconds
        ));
    }

    if score.question_count() > 0 {
        html.push_str(&generate_bar_chart(&outcome_bars(report)));
    }

    html.push_str("</section>\n");

    // Per-question results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th onclick=\"sortTable(1)\">Question</th><th onclick=\"sortTable(2)\">Your answer</th><th onclick=\"sortTable(3)\">Correct answer</th><th onclick=\"sortTable(4)\">Result</th><th onclick=\"sortTable(5)\">Marks</th><th onclick=\"sortTable(6)\">Time</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for row in &report.rows {
        let class = outcome_class(row.outcome);
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:+.2}</td><td>{}s</td></tr>\n",
            class,
            row.index + 1,
            html_escape(&row.prompt),
            row.selected.as_deref().map(html_escape).unwrap_or_else(|| "-".to_string()),
            html_escape(&row.correct),
            row.outcome,
            row.marks,
            row.seconds,
        ));
    }

    html.push_str("</tbody></table>\n");

    if report.rows.iter().any(|r| r.seconds > 0) {
        html.push_str("<h2>Time per question</h2>\n");
        html.push_str(&generate_bar_chart(&time_bars(report)));
    }

    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AttemptReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn outcome_class(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Correct => "pass",
        Outcome::Wrong => "fail",
        Outcome::Skipped => "skip",
    }
}

fn outcome_bars(report: &AttemptReport) -> Vec<Bar> {
    let total = report.score.question_count().max(1) as f64;
    [
        ("Correct", report.score.correct_count, "#22c55e"),
        ("Wrong", report.score.wrong_count, "#ef4444"),
        ("Skipped", report.score.skipped_count, "#9ca3af"),
    ]
    .into_iter()
    .map(|(label, count, color)| Bar {
        label: label.to_string(),
        fraction: count as f64 / total,
        text: count.to_string(),
        color,
    })
    .collect()
}

fn time_bars(report: &AttemptReport) -> Vec<Bar> {
    let longest = report.rows.iter().map(|r| r.seconds).max().unwrap_or(0).max(1) as f64;
    report
        .rows
        .iter()
        .map(|r| Bar {
            label: format!("Q{}", r.index + 1),
            fraction: r.seconds as f64 / longest,
            text: format!("{}s", r.seconds),
            color: match r.outcome {
                Outcome::Correct => "#22c55e",
                Outcome::Wrong => "#ef4444",
                Outcome::Skipped => "#9ca3af",
            },
        })
        .collect()
}

fn generate_bar_chart(bars: &[Bar]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 120;

    let total_height = bars.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, bar) in bars.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (bar.fraction.clamp(0.0, 1.0) * max_width as f64) as usize;

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&bar.label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, bar.color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            html_escape(&bar.text)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --skip: #f3f4f6; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --skip: #1f2937; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.skip { background: var(--skip); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
