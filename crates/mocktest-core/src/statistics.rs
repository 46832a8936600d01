//! Post-submission summary statistics.

use serde::{Deserialize, Serialize};

use crate::scoring::ScoreCard;
use crate::timing::TimeLedger;

/// Time spent on one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTime {
    /// 0-based question index.
    pub index: usize,
    pub seconds: u64,
}

/// Summary of a submitted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub question_count: usize,
    /// Questions with an answer, right or wrong.
    pub attempted: usize,
    pub elapsed_seconds: u64,
    /// Elapsed time divided by the number of questions.
    pub average_seconds: f64,
    /// Question with the least time recorded.
    pub fastest: Option<QuestionTime>,
    /// Question with the most time recorded.
    pub slowest: Option<QuestionTime>,
    /// Correct answers over all questions, in percent, one decimal.
    pub accuracy_pct: f64,
    /// Total score over the best possible score, in percent, one decimal.
    pub score_pct: f64,
}

/// Derive the summary of an attempt from its score card and timing.
///
/// Fastest and slowest only consider questions that have time recorded.
/// Ties go to the lowest question index.
pub fn summarize(card: &ScoreCard, timing: &TimeLedger) -> Summary {
    let question_count = card.question_count();
    let elapsed = timing.elapsed_seconds();

    let average_seconds = if question_count == 0 {
        0.0
    } else {
        elapsed as f64 / question_count as f64
    };

    let mut fastest: Option<QuestionTime> = None;
    let mut slowest: Option<QuestionTime> = None;
    for (&index, &seconds) in timing.per_question() {
        let entry = QuestionTime { index, seconds };
        if fastest.map_or(true, |f| seconds < f.seconds) {
            fastest = Some(entry);
        }
        if slowest.map_or(true, |s| seconds > s.seconds) {
            slowest = Some(entry);
        }
    }

    let accuracy_pct = if question_count == 0 {
        0.0
    } else {
        round1(card.correct_count as f64 / question_count as f64 * 100.0)
    };

    Summary {
        question_count,
        attempted: card.attempted(),
        elapsed_seconds: elapsed,
        average_seconds,
        fastest,
        slowest,
        accuracy_pct,
        score_pct: round1(card.score_pct()),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
