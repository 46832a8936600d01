//! Attempt reports with JSON persistence and a markdown results table.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::scoring::{Outcome, ScoreCard};
use crate::session::SessionController;
use crate::statistics::Summary;
use crate::timing::format_clock;

/// A complete record of one submitted attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the bank.
    pub bank: BankSummary,
    pub score: ScoreCard,
    pub summary: Summary,
    /// One row per question, in bank order.
    pub rows: Vec<QuestionRow>,
}

/// Summary of a bank (without the questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSummary {
    pub name: String,
    pub question_count: usize,
}

/// Result for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRow {
    /// 0-based question index.
    pub index: usize,
    pub prompt: String,
    /// Text of the chosen option.
    #[serde(default)]
    pub selected: Option<String>,
    /// Text of the correct option.
    pub correct: String,
    pub outcome: Outcome,
    /// Marks this question contributed.
    pub marks: f64,
    /// Seconds the question was on screen.
    pub seconds: u64,
}

impl AttemptReport {
    /// Build the report of a submitted attempt.
    pub fn from_session(session: &SessionController) -> SessionResult<Self> {
        let summary = session.summary()?;
        let score = session
            .score_card()
            .cloned()
            .ok_or_else(|| SessionError::validation("test has not been graded"))?;

        let rows = session
            .bank()
            .iter()
            .enumerate()
            .map(|(index, q)| {
                let outcome = score.outcomes.get(index).copied().unwrap_or(Outcome::Skipped);
                let selected = session.answer(index);
                QuestionRow {
                    index,
                    prompt: q.prompt().to_string(),
                    selected: selected.and_then(|o| q.options().get(o).cloned()),
                    correct: q.options()[q.correct_answer()].clone(),
                    outcome,
                    marks: match outcome {
                        Outcome::Correct => q.marks().correct,
                        Outcome::Wrong => q.marks().wrong,
                        Outcome::Skipped => 0.0,
                    },
                    seconds: session.timing().seconds_on(index),
                }
            })
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            bank: BankSummary {
                name: session.bank().name.clone(),
                question_count: session.bank().len(),
            },
            score,
            summary,
            rows,
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AttemptReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.bank.name));
        md.push_str(&format!(
            "**Score:** {} / {:.2} | **Correct:** {} | **Wrong:** {} | **Skipped:** {}\n\n",
            self.score.total_display(),
            self.score.max_score,
            self.score.correct_count,
            self.score.wrong_count,
            self.score.skipped_count
        ));
        md.push_str(&format!(
            "**Accuracy:** {:.1}% | **Time:** {} | **Average per question:** {:.1}s\n\n",
            self.summary.accuracy_pct,
            format_clock(self.summary.elapsed_seconds),
            self.summary.average_seconds
        ));

        md.push_str("| # | Question | Your answer | Correct answer | Result | Marks | Time |\n");
        md.push_str("|---|----------|-------------|----------------|--------|-------|------|\n");
        for row in &self.rows {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:+.2} | {}s |\n",
                row.index + 1,
                escape_cell(&row.prompt),
                row.selected.as_deref().map(escape_cell).unwrap_or_else(|| "-".into()),
                escape_cell(&row.correct),
                row.outcome,
                row.marks,
                row.seconds
            ));
        }

        md
    }
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionBank;

    fn submitted_session() -> SessionController {
        let mut session = SessionController::new(QuestionBank::sample());
        session.start().unwrap();
        session.record_answer(2).unwrap();
        session.tick();
        session.save_and_next().unwrap();
        session.record_answer(0).unwrap();
        session.tick();
        session.tick();
        session.submit().unwrap();
        session
    }

    #[test]
    fn report_requires_submission() {
        let mut session = SessionController::new(QuestionBank::sample());
        assert!(AttemptReport::from_session(&session).is_err());
        session.start().unwrap();
        assert!(AttemptReport::from_session(&session).is_err());
    }

    #[test]
    fn rows_follow_the_bank() {
        let report = AttemptReport::from_session(&submitted_session()).unwrap();
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].selected.as_deref(), Some("Paris"));
        assert_eq!(report.rows[0].outcome, Outcome::Correct);
        assert_eq!(report.rows[1].selected.as_deref(), Some("Venus"));
        assert_eq!(report.rows[1].correct, "Mars");
        assert_eq!(report.rows[1].seconds, 2);
        assert_eq!(report.rows[2].selected, None);
        assert_eq!(report.rows[2].marks, 0.0);
        assert_eq!(report.score.total_display(), "1.34");
    }

    #[test]
    fn json_roundtrip() {
        let report = AttemptReport::from_session(&submitted_session()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attempt.json");

        report.save_json(&path).unwrap();
        let loaded = AttemptReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.bank.name, "Sample test");
        assert_eq!(loaded.rows.len(), 3);
    }

    #[test]
    fn markdown_output() {
        let report = AttemptReport::from_session(&submitted_session()).unwrap();
        let md = report.to_markdown();
        assert!(md.contains("**Score:** 1.34"));
        assert!(md.contains("| 2 | Which planet is known as the Red Planet? | Venus | Mars | wrong | -0.66 | 2s |"));
        assert!(md.contains("| 3 | What is 2 + 2? | - | 4 | skipped | +0.00 | 0s |"));
    }
}
