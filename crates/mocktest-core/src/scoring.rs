//! Score computation for a finished attempt.
//!
//! The score depends only on the bank and the final answers, never on the
//! order in which questions were visited.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerRecord, QuestionBank};

/// How a single question was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Wrong,
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Correct => write!(f, "correct"),
            Outcome::Wrong => write!(f, "wrong"),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Final score and counts for an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// Sum of the marks earned and lost.
    pub total_score: f64,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub skipped_count: usize,
    /// Best possible total: every question correct.
    pub max_score: f64,
    /// Per-question outcome, in bank order.
    pub outcomes: Vec<Outcome>,
}

impl ScoreCard {
    /// Total with two decimals, e.g. `"1.34"`.
    pub fn total_display(&self) -> String {
        format!("{:.2}", self.total_score)
    }

    pub fn question_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn attempted(&self) -> usize {
        self.correct_count + self.wrong_count
    }

    /// Total as a percentage of `max_score`; 0 when nothing can be earned.
    pub fn score_pct(&self) -> f64 {
        if self.max_score <= 0.0 {
            return 0.0;
        }
        self.total_score / self.max_score * 100.0
    }
}

/// Score every question of `bank` against `answers`.
///
/// Unanswered questions contribute nothing, correct ones add
/// `marks.correct`, wrong ones add `marks.wrong` unchanged.
pub fn compute_score(bank: &QuestionBank, answers: &AnswerRecord) -> ScoreCard {
    let mut card = ScoreCard {
        total_score: 0.0,
        correct_count: 0,
        wrong_count: 0,
        skipped_count: 0,
        max_score: bank.max_score(),
        outcomes: Vec::with_capacity(bank.len()),
    };

    for (index, question) in bank.iter().enumerate() {
        let outcome = match answers.get(index) {
            None => {
                card.skipped_count += 1;
                Outcome::Skipped
            }
            Some(option) if question.is_correct(option) => {
                card.total_score += question.marks().correct;
                card.correct_count += 1;
                Outcome::Correct
            }
            Some(_) => {
                card.total_score += question.marks().wrong;
                card.wrong_count += 1;
                Outcome::Wrong
            }
        };
        card.outcomes.push(outcome);
    }

    card
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Marks, Question};
    use proptest::prelude::*;

    fn bank_with_correct(correct: &[usize]) -> QuestionBank {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Question::new(
                    format!("Question {i}"),
                    vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    c,
                    Marks::default(),
                )
                .unwrap()
            })
            .collect();
        QuestionBank::from_questions("test", questions)
    }

    #[test]
    fn mixed_answers() {
        let bank = bank_with_correct(&[2, 1, 3]);
        let answers: AnswerRecord = [(0, 2), (1, 0)].into_iter().collect();

        let card = compute_score(&bank, &answers);
        assert_eq!(card.correct_count, 1);
        assert_eq!(card.wrong_count, 1);
        assert_eq!(card.skipped_count, 1);
        assert_eq!(card.total_display(), "1.34");
        assert_eq!(
            card.outcomes,
            vec![Outcome::Correct, Outcome::Wrong, Outcome::Skipped]
        );
    }

    #[test]
    fn positive_wrong_marks_are_added_as_is() {
        let mut bank = bank_with_correct(&[0, 0]);
        bank.bulk_set_marks(1.0, 0.5).unwrap();
        let answers: AnswerRecord = [(0, 1), (1, 1)].into_iter().collect();
        let card = compute_score(&bank, &answers);
        assert_eq!(card.total_display(), "1.00");
    }

    #[test]
    fn all_skipped_scores_zero() {
        let bank = bank_with_correct(&[0, 1, 2]);
        let card = compute_score(&bank, &AnswerRecord::new());
        assert_eq!(card.skipped_count, 3);
        assert_eq!(card.total_display(), "0.00");
        assert_eq!(card.attempted(), 0);
        assert!((card.max_score - 6.0).abs() < 1e-9);
    }

    #[test]
    fn score_pct_of_max() {
        let bank = bank_with_correct(&[0, 0]);
        let answers: AnswerRecord = [(0, 0)].into_iter().collect();
        let card = compute_score(&bank, &answers);
        assert!((card.score_pct() - 50.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn answer_insertion_order_does_not_matter(
            picks in proptest::collection::vec(proptest::option::of(0usize..4), 1..12),
        ) {
            let correct: Vec<usize> = (0..picks.len()).map(|i| i % 4).collect();
            let bank = bank_with_correct(&correct);

            let forward: AnswerRecord = picks
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.map(|o| (i, o)))
                .collect();
            let backward: AnswerRecord = picks
                .iter()
                .enumerate()
                .rev()
                .filter_map(|(i, p)| p.map(|o| (i, o)))
                .collect();

            let a = compute_score(&bank, &forward);
            let b = compute_score(&bank, &backward);
            prop_assert_eq!(a.clone(), b);
            prop_assert_eq!(a.correct_count + a.wrong_count + a.skipped_count, picks.len());
        }

        #[test]
        fn score_is_deterministic(picks in proptest::collection::vec(0usize..4, 1..8)) {
            let bank = bank_with_correct(&vec![0; picks.len()]);
            let answers: AnswerRecord = picks.iter().copied().enumerate().collect();
            prop_assert_eq!(compute_score(&bank, &answers), compute_score(&bank, &answers));
        }
    }
}
