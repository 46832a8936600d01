//! Core data model types for mocktest.
//!
//! A [`QuestionBank`] is an ordered list of validated [`Question`]s plus the
//! marking scheme applied to questions that do not bring their own. Marks
//! are normalized once, when a question is built, so scoring never has to
//! fall back to defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Default credit for a correct answer.
pub const DEFAULT_MARKS_CORRECT: f64 = 2.0;
/// Default value added for a wrong answer.
pub const DEFAULT_MARKS_WRONG: f64 = -0.66;

/// Marking scheme for a single question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marks {
    /// Added to the total when the answer is correct.
    #[serde(default = "default_correct")]
    pub correct: f64,
    /// Added to the total when the answer is wrong. Usually negative, but
    /// applied as-is whatever its sign.
    #[serde(default = "default_wrong")]
    pub wrong: f64,
}

fn default_correct() -> f64 {
    DEFAULT_MARKS_CORRECT
}

fn default_wrong() -> f64 {
    DEFAULT_MARKS_WRONG
}

impl Default for Marks {
    fn default() -> Self {
        Self {
            correct: DEFAULT_MARKS_CORRECT,
            wrong: DEFAULT_MARKS_WRONG,
        }
    }
}

impl Marks {
    pub fn new(correct: f64, wrong: f64) -> SessionResult<Self> {
        let marks = Self { correct, wrong };
        marks.ensure_finite()?;
        Ok(marks)
    }

    fn ensure_finite(&self) -> SessionResult<()> {
        if !self.correct.is_finite() || !self.wrong.is_finite() {
            return Err(SessionError::validation("marks must be finite numbers"));
        }
        Ok(())
    }
}

/// A question as entered by a user or read from an import, before
/// validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    /// Per-question marks; the bank's scheme is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Marks>,
}

/// A validated multiple-choice question.
///
/// `correct_answer` always indexes an existing option and every text field
/// is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    marks: Marks,
}

impl Question {
    /// Build a question, checking every field.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        marks: Marks,
    ) -> SessionResult<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(SessionError::validation("question text is required"));
        }
        if options.len() < 2 {
            return Err(SessionError::validation(format!(
                "a question needs at least 2 options, got {}",
                options.len()
            )));
        }
        if let Some(pos) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(SessionError::validation(format!(
                "option {} is empty",
                pos + 1
            )));
        }
        if correct_answer >= options.len() {
            return Err(SessionError::validation(format!(
                "correct answer {} is out of range for {} options",
                correct_answer,
                options.len()
            )));
        }
        marks.ensure_finite()?;

        Ok(Self {
            prompt,
            options,
            correct_answer,
            marks,
        })
    }

    /// Validate a draft, filling missing marks from `fallback`.
    pub fn from_draft(draft: QuestionDraft, fallback: Marks) -> SessionResult<Self> {
        let marks = draft.marks.unwrap_or(fallback);
        Self::new(draft.prompt, draft.options, draft.correct_answer, marks)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    pub fn marks(&self) -> Marks {
        self.marks
    }

    pub fn set_marks(&mut self, marks: Marks) {
        self.marks = marks;
    }

    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = SessionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        Question::from_draft(draft, Marks::default())
    }
}

impl From<Question> for QuestionDraft {
    fn from(q: Question) -> Self {
        QuestionDraft {
            prompt: q.prompt,
            options: q.options,
            correct_answer: q.correct_answer,
            marks: Some(q.marks),
        }
    }
}

/// An ordered, editable set of questions for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    /// Human-readable name, shown in reports.
    pub name: String,
    /// Scheme applied to questions added or imported without marks.
    #[serde(default)]
    marks: Marks,
    #[serde(default)]
    questions: Vec<Question>,
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::new("Untitled test")
    }
}

impl QuestionBank {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marks: Marks::default(),
            questions: Vec::new(),
        }
    }

    pub fn with_marks(mut self, marks: Marks) -> Self {
        self.marks = marks;
        self
    }

    pub fn from_questions(name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            name: name.into(),
            marks: Marks::default(),
            questions,
        }
    }

    /// The three-question general knowledge bank used by `init` and when
    /// no bank is supplied.
    pub fn sample() -> Self {
        let q = |prompt: &str, options: [&str; 4], correct: usize| Question {
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct,
            marks: Marks::default(),
        };
        Self::from_questions(
            "Sample test",
            vec![
                q(
                    "What is the capital of France?",
                    ["London", "Berlin", "Paris", "Madrid"],
                    2,
                ),
                q(
                    "Which planet is known as the Red Planet?",
                    ["Venus", "Mars", "Jupiter", "Saturn"],
                    1,
                ),
                q("What is 2 + 2?", ["3", "4", "5", "6"], 1),
            ],
        )
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    /// The scheme applied to new questions without their own marks.
    pub fn marks(&self) -> Marks {
        self.marks
    }

    /// Validate a draft and append it. The bank is unchanged on error.
    pub fn add_question(&mut self, draft: QuestionDraft) -> SessionResult<usize> {
        let question = Question::from_draft(draft, self.marks)?;
        self.questions.push(question);
        tracing::debug!(count = self.questions.len(), "question added");
        Ok(self.questions.len() - 1)
    }

    pub fn push(&mut self, question: Question) {
        self.questions.push(question);
    }

    pub fn delete_question(&mut self, index: usize) -> SessionResult<Question> {
        if index >= self.questions.len() {
            return Err(SessionError::validation(format!(
                "question {} does not exist (bank has {})",
                index + 1,
                self.questions.len()
            )));
        }
        Ok(self.questions.remove(index))
    }

    pub fn clear_all(&mut self) {
        self.questions.clear();
    }

    /// Overwrite the marks of every question and adopt them as the bank's
    /// scheme for later additions.
    pub fn bulk_set_marks(&mut self, correct: f64, wrong: f64) -> SessionResult<()> {
        let marks = Marks::new(correct, wrong)?;
        for q in &mut self.questions {
            q.set_marks(marks);
        }
        self.marks = marks;
        Ok(())
    }

    /// Append already-validated questions as one batch.
    pub fn extend(&mut self, questions: Vec<Question>) -> usize {
        let n = questions.len();
        self.questions.extend(questions);
        n
    }

    /// Sum of the marks available for correct answers.
    pub fn max_score(&self) -> f64 {
        self.questions.iter().map(|q| q.marks.correct).sum()
    }
}

/// Selected option per question index. A missing entry means the question
/// was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerRecord(BTreeMap<usize, usize>);

impl AnswerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question: usize) -> Option<usize> {
        self.0.get(&question).copied()
    }

    /// Insert or replace the answer for `question`, returning the old one.
    pub fn set(&mut self, question: usize, option: usize) -> Option<usize> {
        self.0.insert(question, option)
    }

    pub fn remove(&mut self, question: usize) -> Option<usize> {
        self.0.remove(&question)
    }

    pub fn contains(&self, question: usize) -> bool {
        self.0.contains_key(&question)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// `(question, option)` pairs in question order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(&q, &o)| (q, o))
    }
}

impl FromIterator<(usize, usize)> for AnswerRecord {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(prompt: &str, options: &[&str], correct: usize) -> QuestionDraft {
        QuestionDraft {
            prompt: prompt.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct,
            marks: None,
        }
    }

    #[test]
    fn add_question_fills_bank_marks() {
        let mut bank = QuestionBank::new("t").with_marks(Marks::new(4.0, -1.0).unwrap());
        bank.add_question(draft("Q?", &["a", "b", "c", "d"], 3)).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.questions()[0].marks(), Marks::new(4.0, -1.0).unwrap());
    }

    #[test]
    fn add_question_rejects_empty_fields() {
        let mut bank = QuestionBank::new("t");
        let err = bank.add_question(draft("", &["a", "b"], 0)).unwrap_err();
        assert!(err.to_string().contains("question text"));
        let err = bank.add_question(draft("Q?", &["a", " ", "c", "d"], 0)).unwrap_err();
        assert!(err.to_string().contains("option 2"));
        assert!(bank.is_empty());
    }

    #[test]
    fn correct_answer_must_index_an_option() {
        let err = Question::new("Q?", vec!["a".into(), "b".into()], 2, Marks::default());
        assert!(err.is_err());
    }

    #[test]
    fn delete_and_clear() {
        let mut bank = QuestionBank::sample();
        let removed = bank.delete_question(0).unwrap();
        assert_eq!(removed.prompt(), "What is the capital of France?");
        assert_eq!(bank.len(), 2);
        assert!(bank.delete_question(5).is_err());
        bank.clear_all();
        assert!(bank.is_empty());
    }

    #[test]
    fn bulk_set_marks_overwrites_every_question() {
        let mut bank = QuestionBank::sample();
        bank.bulk_set_marks(1.0, 0.0).unwrap();
        assert!(bank.iter().all(|q| q.marks() == Marks { correct: 1.0, wrong: 0.0 }));
        assert_eq!(bank.marks().wrong, 0.0);
        assert!(bank.bulk_set_marks(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn deserialize_fills_default_marks() {
        let json = r#"{"prompt":"Q?","options":["a","b"],"correct_answer":1}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.marks(), Marks::default());
    }

    #[test]
    fn deserialize_validates() {
        let json = r#"{"prompt":"Q?","options":["a","b"],"correct_answer":7}"#;
        assert!(serde_json::from_str::<Question>(json).is_err());
    }

    #[test]
    fn answer_record_upserts() {
        let mut answers = AnswerRecord::new();
        assert_eq!(answers.set(1, 2), None);
        assert_eq!(answers.set(1, 3), Some(2));
        assert_eq!(answers.get(1), Some(3));
        assert!(!answers.contains(0));
        assert_eq!(answers.iter().collect::<Vec<_>>(), vec![(1, 3)]);
    }

    #[test]
    fn max_score_sums_correct_marks() {
        assert!((QuestionBank::sample().max_score() - 6.0).abs() < 1e-9);
    }
}
