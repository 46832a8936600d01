//! The session controller: one test attempt over one question bank.
//!
//! ## Phases
//!
//! ```text
//! NotStarted --start--> InProgress --submit--> Submitted
//!      ^                    |                      |
//!      +-------reset--------+----------reset-------+
//! ```
//!
//! The controller owns the bank, the answers, and the timing for the
//! attempt. Front-ends never touch them directly; they send intents through
//! the methods below and render what the accessors return. A rejected
//! intent returns a [`SessionError`] and changes nothing.
//!
//! While `NotStarted` the position is always 0 and there are no answers, so
//! the bank can be edited safely in that phase only.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};
use crate::model::{AnswerRecord, Question, QuestionBank};
use crate::scoring::{compute_score, Outcome, ScoreCard};
use crate::statistics::{summarize, Summary};
use crate::timing::TimeLedger;

/// Where an attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    InProgress,
    Submitted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NotStarted => write!(f, "not started"),
            Phase::InProgress => write!(f, "in progress"),
            Phase::Submitted => write!(f, "submitted"),
        }
    }
}

/// Navigation state and timing of an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    current_index: usize,
    phase: Phase,
    timing: TimeLedger,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_index: 0,
            phase: Phase::NotStarted,
            timing: TimeLedger::new(),
        }
    }
}

impl SessionState {
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        self.phase == Phase::InProgress
    }

    pub fn is_submitted(&self) -> bool {
        self.phase == Phase::Submitted
    }

    pub fn timing(&self) -> &TimeLedger {
        &self.timing
    }
}

/// How a question should be shown in a navigation strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    /// No answer yet (before submission).
    Unanswered,
    /// Has an answer (before submission).
    Answered,
    /// After submission: the graded outcome.
    Graded(Outcome),
}

/// Controller for a single test attempt.
#[derive(Debug, Clone)]
pub struct SessionController {
    bank: QuestionBank,
    answers: AnswerRecord,
    state: SessionState,
    score: Option<ScoreCard>,
    reset_pending: bool,
}

impl SessionController {
    pub fn new(bank: QuestionBank) -> Self {
        Self {
            bank,
            answers: AnswerRecord::new(),
            state: SessionState::default(),
            score: None,
            reset_pending: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    pub fn is_submitted(&self) -> bool {
        self.state.is_submitted()
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.bank.get(self.state.current_index)
    }

    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    pub fn answer(&self, question: usize) -> Option<usize> {
        self.answers.get(question)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.state.timing.elapsed_seconds()
    }

    pub fn timing(&self) -> &TimeLedger {
        &self.state.timing
    }

    /// Seconds charged to each question that has been on screen.
    pub fn per_question_elapsed(&self) -> &BTreeMap<usize, u64> {
        self.state.timing.per_question()
    }

    /// Score card of the submitted attempt.
    pub fn score_card(&self) -> Option<&ScoreCard> {
        self.score.as_ref()
    }

    /// Position as a fraction: question 2 of 4 is 0.5.
    pub fn progress(&self) -> f64 {
        if self.bank.is_empty() {
            return 0.0;
        }
        (self.state.current_index + 1) as f64 / self.bank.len() as f64
    }

    pub fn question_status(&self, question: usize) -> Option<QuestionStatus> {
        if question >= self.bank.len() {
            return None;
        }
        if let Some(card) = &self.score {
            return card.outcomes.get(question).copied().map(QuestionStatus::Graded);
        }
        Some(if self.answers.contains(question) {
            QuestionStatus::Answered
        } else {
            QuestionStatus::Unanswered
        })
    }

    /// Summary statistics; only available after submission.
    pub fn summary(&self) -> SessionResult<Summary> {
        match &self.score {
            Some(card) if self.is_submitted() => Ok(summarize(card, &self.state.timing)),
            _ => Err(self.rejected("view the summary")),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> SessionResult<()> {
        if self.state.phase != Phase::NotStarted {
            return Err(self.rejected("start"));
        }
        if self.bank.is_empty() {
            return Err(SessionError::validation("add at least one question first"));
        }
        self.state.phase = Phase::InProgress;
        tracing::debug!(questions = self.bank.len(), "attempt started");
        Ok(())
    }

    /// Select `option` for the current question, replacing any earlier
    /// choice.
    pub fn record_answer(&mut self, option: usize) -> SessionResult<()> {
        self.require_in_progress("record an answer")?;
        let index = self.state.current_index;
        let count = self.current_option_count();
        if option >= count {
            return Err(SessionError::validation(format!(
                "option {} does not exist (question has {count})",
                option + 1
            )));
        }
        self.answers.set(index, option);
        tracing::debug!(question = index, option, "answer recorded");
        Ok(())
    }

    /// Remove the answer for the current question.
    pub fn clear_answer(&mut self) -> SessionResult<()> {
        self.require_in_progress("clear an answer")?;
        self.answers.remove(self.state.current_index);
        Ok(())
    }

    /// Move to the next question without requiring an answer. Stays put on
    /// the last question.
    pub fn skip(&mut self) -> SessionResult<usize> {
        self.require_in_progress("skip")?;
        Ok(self.advance())
    }

    /// Move to the next question; the current one must be answered.
    pub fn save_and_next(&mut self) -> SessionResult<usize> {
        self.require_in_progress("save and continue")?;
        if !self.answers.contains(self.state.current_index) {
            return Err(SessionError::validation(
                "answer required: select an option before saving",
            ));
        }
        Ok(self.advance())
    }

    /// Move to the previous question. Stays put on the first question.
    pub fn previous(&mut self) -> SessionResult<usize> {
        self.require_in_progress("go back")?;
        self.state.current_index = self.state.current_index.saturating_sub(1);
        Ok(self.state.current_index)
    }

    /// Jump to `question`. Allowed during the attempt and for review after
    /// submission.
    pub fn navigate_to(&mut self, question: usize) -> SessionResult<()> {
        if self.state.phase == Phase::NotStarted {
            return Err(self.rejected("navigate"));
        }
        if question >= self.bank.len() {
            return Err(SessionError::validation(format!(
                "question {} does not exist (test has {})",
                question + 1,
                self.bank.len()
            )));
        }
        self.state.current_index = question;
        Ok(())
    }

    /// Grade the attempt and stop the clock. Can only happen once per
    /// attempt.
    pub fn submit(&mut self) -> SessionResult<&ScoreCard> {
        self.require_in_progress("submit")?;
        let card = compute_score(&self.bank, &self.answers);
        tracing::info!(
            score = %card.total_display(),
            correct = card.correct_count,
            wrong = card.wrong_count,
            skipped = card.skipped_count,
            elapsed = self.state.timing.elapsed_seconds(),
            "test submitted"
        );
        self.state.phase = Phase::Submitted;
        Ok(self.score.insert(card))
    }

    /// Clear answers, timing and position. Allowed in any phase.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.state = SessionState::default();
        self.score = None;
        self.reset_pending = true;
        tracing::debug!("attempt reset");
    }

    /// Count one elapsed second against the question on screen. Ignored
    /// unless the attempt is in progress; returns whether it was counted.
    pub fn tick(&mut self) -> bool {
        if !self.is_started() {
            return false;
        }
        self.state.timing.record_tick(self.state.current_index);
        true
    }

    /// `true` exactly once after each [`reset`](Self::reset).
    pub fn take_reset_signal(&mut self) -> bool {
        std::mem::take(&mut self.reset_pending)
    }

    /// Edit the bank. Only possible before the attempt starts.
    pub fn bank_mut(&mut self) -> SessionResult<&mut QuestionBank> {
        if self.state.phase != Phase::NotStarted {
            return Err(self.rejected("edit questions"));
        }
        Ok(&mut self.bank)
    }

    /// Swap in a different bank. Only possible before the attempt starts.
    pub fn replace_bank(&mut self, bank: QuestionBank) -> SessionResult<QuestionBank> {
        let slot = self.bank_mut()?;
        Ok(std::mem::replace(slot, bank))
    }

    // ── Internals ────────────────────────────────────────────────────

    fn advance(&mut self) -> usize {
        let last = self.bank.len().saturating_sub(1);
        self.state.current_index = (self.state.current_index + 1).min(last);
        self.state.current_index
    }

    fn current_option_count(&self) -> usize {
        self.current_question().map_or(0, Question::option_count)
    }

    fn require_in_progress(&self, action: &'static str) -> SessionResult<()> {
        if self.state.phase == Phase::InProgress {
            Ok(())
        } else {
            Err(self.rejected(action))
        }
    }

    fn rejected(&self, action: &'static str) -> SessionError {
        tracing::warn!(action, phase = %self.state.phase, "intent rejected");
        SessionError::State {
            action,
            state: self.state.phase.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{Marks, QuestionDraft};
    use proptest::prelude::*;

    fn started() -> SessionController {
        let mut session = SessionController::new(QuestionBank::sample());
        session.start().unwrap();
        session
    }

    #[test]
    fn new_session_is_not_started() {
        let session = SessionController::new(QuestionBank::sample());
        assert_eq!(session.phase(), Phase::NotStarted);
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
        assert!(session.score_card().is_none());
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut session = started();
        assert_eq!(session.start().unwrap_err().kind(), ErrorKind::State);
        session.submit().unwrap();
        assert_eq!(session.start().unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn start_requires_questions() {
        let mut session = SessionController::new(QuestionBank::new("empty"));
        assert_eq!(session.start().unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(session.phase(), Phase::NotStarted);
    }

    #[test]
    fn answer_before_start_is_rejected() {
        let mut session = SessionController::new(QuestionBank::sample());
        let err = session.record_answer(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn answer_out_of_range_is_rejected() {
        let mut session = started();
        let err = session.record_answer(4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.answer(0), None);
    }

    #[test]
    fn record_then_read_back_every_question() {
        let mut session = started();
        for i in 0..session.bank().len() {
            session.navigate_to(i).unwrap();
            session.record_answer(3 - i).unwrap();
            assert_eq!(session.answer(i), Some(3 - i));
        }
        session.record_answer(0).unwrap();
        assert_eq!(session.answer(2), Some(0));
    }

    #[test]
    fn skip_and_previous_clamp() {
        let mut session = started();
        assert_eq!(session.previous().unwrap(), 0);
        assert_eq!(session.skip().unwrap(), 1);
        assert_eq!(session.skip().unwrap(), 2);
        assert_eq!(session.skip().unwrap(), 2);
        assert_eq!(session.previous().unwrap(), 1);
    }

    #[test]
    fn save_and_next_requires_answer() {
        let mut session = started();
        let err = session.save_and_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("answer required"));
        assert_eq!(session.current_index(), 0);

        session.record_answer(2).unwrap();
        assert_eq!(session.save_and_next().unwrap(), 1);
    }

    #[test]
    fn clear_answer_turns_into_skip() {
        let mut session = started();
        session.record_answer(2).unwrap();
        session.clear_answer().unwrap();
        assert_eq!(session.answer(0), None);
        assert!(session.save_and_next().is_err());
    }

    #[test]
    fn navigation_rules() {
        let mut session = SessionController::new(QuestionBank::sample());
        assert_eq!(session.navigate_to(1).unwrap_err().kind(), ErrorKind::State);
        session.start().unwrap();
        session.navigate_to(2).unwrap();
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.navigate_to(3).unwrap_err().kind(), ErrorKind::Validation);

        session.submit().unwrap();
        session.navigate_to(0).unwrap();
        assert_eq!(session.current_index(), 0);
        assert!(session.skip().is_err());
        assert!(session.record_answer(1).is_err());
    }

    #[test]
    fn scenario_score() {
        let mut session = started();
        session.record_answer(2).unwrap();
        session.save_and_next().unwrap();
        session.record_answer(0).unwrap();
        session.skip().unwrap();
        let card = session.submit().unwrap().clone();
        assert_eq!(card.correct_count, 1);
        assert_eq!(card.wrong_count, 1);
        assert_eq!(card.skipped_count, 1);
        assert_eq!(card.total_display(), "1.34");
    }

    #[test]
    fn submit_is_once_only() {
        let mut session = started();
        session.record_answer(2).unwrap();
        let first = session.submit().unwrap().total_score;
        assert_eq!(session.submit().unwrap_err().kind(), ErrorKind::State);
        assert_eq!(session.score_card().unwrap().total_score, first);
    }

    #[test]
    fn submit_before_start_is_rejected() {
        let mut session = SessionController::new(QuestionBank::sample());
        assert_eq!(session.submit().unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn reset_after_submit_restores_initial_state() {
        let mut session = started();
        session.record_answer(1).unwrap();
        session.tick();
        session.skip().unwrap();
        session.tick();
        session.submit().unwrap();

        session.reset();
        assert_eq!(session.phase(), Phase::NotStarted);
        assert!(!session.is_started());
        assert!(!session.is_submitted());
        assert!(session.answers().is_empty());
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.elapsed_seconds(), 0);
        assert!(session.per_question_elapsed().is_empty());
        assert!(session.score_card().is_none());
    }

    #[test]
    fn reset_signal_is_one_shot() {
        let mut session = started();
        assert!(!session.take_reset_signal());
        session.reset();
        assert!(session.take_reset_signal());
        assert!(!session.take_reset_signal());
    }

    #[test]
    fn ticks_only_count_while_running() {
        let mut session = SessionController::new(QuestionBank::sample());
        assert!(!session.tick());
        session.start().unwrap();
        assert!(session.tick());
        session.submit().unwrap();
        assert!(!session.tick());
        assert_eq!(session.elapsed_seconds(), 1);
    }

    #[test]
    fn revisits_keep_accumulating() {
        let mut session = started();
        session.tick();
        session.tick();
        session.skip().unwrap();
        session.tick();
        session.previous().unwrap();
        session.tick();

        assert_eq!(session.timing().seconds_on(0), 3);
        assert_eq!(session.timing().seconds_on(1), 1);
        assert_eq!(session.elapsed_seconds(), 4);
    }

    #[test]
    fn summary_only_after_submit() {
        let mut session = started();
        assert!(session.summary().is_err());
        session.record_answer(2).unwrap();
        session.tick();
        session.submit().unwrap();
        let summary = session.summary().unwrap();
        assert_eq!(summary.question_count, 3);
        assert_eq!(summary.accuracy_pct, 33.3);
        assert_eq!(summary.elapsed_seconds, 1);
    }

    #[test]
    fn question_status_before_and_after_submit() {
        let mut session = started();
        session.record_answer(0).unwrap();
        assert_eq!(session.question_status(0), Some(QuestionStatus::Answered));
        assert_eq!(session.question_status(1), Some(QuestionStatus::Unanswered));
        assert_eq!(session.question_status(3), None);

        session.submit().unwrap();
        assert_eq!(
            session.question_status(0),
            Some(QuestionStatus::Graded(Outcome::Wrong))
        );
        assert_eq!(
            session.question_status(1),
            Some(QuestionStatus::Graded(Outcome::Skipped))
        );
    }

    #[test]
    fn progress_fraction() {
        let mut session = started();
        assert!((session.progress() - 1.0 / 3.0).abs() < 1e-9);
        session.navigate_to(2).unwrap();
        assert!((session.progress() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bank_editing_only_before_start() {
        let mut session = SessionController::new(QuestionBank::sample());
        session
            .bank_mut()
            .unwrap()
            .add_question(QuestionDraft {
                prompt: "Extra?".into(),
                options: vec!["a".into(), "b".into()],
                correct_answer: 1,
                marks: Some(Marks::default()),
            })
            .unwrap();
        assert_eq!(session.bank().len(), 4);

        session.start().unwrap();
        assert_eq!(session.bank_mut().unwrap_err().kind(), ErrorKind::State);
        assert!(session.replace_bank(QuestionBank::new("other")).is_err());

        session.reset();
        let old = session.replace_bank(QuestionBank::new("other")).unwrap();
        assert_eq!(old.len(), 4);
        assert!(session.bank().is_empty());
    }

    #[derive(Debug, Clone)]
    enum Intent {
        Answer(usize),
        Skip,
        Previous,
        Goto(usize),
    }

    fn intent() -> impl Strategy<Value = Intent> {
        prop_oneof![
            (0usize..4).prop_map(Intent::Answer),
            Just(Intent::Skip),
            Just(Intent::Previous),
            (0usize..3).prop_map(Intent::Goto),
        ]
    }

    proptest! {
        #[test]
        fn score_depends_only_on_final_answers(intents in proptest::collection::vec(intent(), 0..40)) {
            let mut session = started();
            for i in &intents {
                let _ = match *i {
                    Intent::Answer(o) => session.record_answer(o),
                    Intent::Skip => session.skip().map(|_| ()),
                    Intent::Previous => session.previous().map(|_| ()),
                    Intent::Goto(q) => session.navigate_to(q),
                };
            }
            let answers = session.answers().clone();
            let card = session.submit().unwrap().clone();
            prop_assert_eq!(card, compute_score(&QuestionBank::sample(), &answers));

            // Replaying only the final answers, in reverse order, scores the same.
            let mut replay = started();
            for (q, o) in answers.iter().collect::<Vec<_>>().into_iter().rev() {
                replay.navigate_to(q).unwrap();
                replay.record_answer(o).unwrap();
            }
            prop_assert_eq!(replay.submit().unwrap().total_score, session.score_card().unwrap().total_score);
        }
    }
}
