//! Question bank import, export, and validation.
//!
//! Three JSON shapes are accepted:
//!
//! - a bare array of `{ question, options, correctAnswer, marks?, negativeMark? }`
//!   with a 0-based correct index (the export format),
//! - an object `{ test_name?, questions: [{ question, options: {key: text},
//!   correct_answer }] }` with a 1-based correct option, and
//! - a saved bank `{ name, marks, questions: [..] }` whose questions use the
//!   array item shape. This is what [`save_bank`] writes, so a bank keeps
//!   its name and marking scheme between runs.
//!
//! Plain text with numbered questions goes through a lossy heuristic that
//! takes the first four lines after each number as options and marks the
//! first one correct.
//!
//! Every importer parses the whole payload before touching the bank, so a
//! malformed batch never leaves a partial insert behind.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SessionError, SessionResult};
use crate::model::{Marks, Question, QuestionBank};

/// Number of option lines the numbered text heuristic collects.
const TEXT_OPTION_COUNT: usize = 4;

/// Array item of the 0-based JSON shape.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexedQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marks: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    negative_mark: Option<f64>,
}

/// Top-level object of the keyed-options JSON shape.
#[derive(Debug, Deserialize)]
struct NamedTest {
    #[serde(default)]
    test_name: Option<String>,
    questions: Vec<KeyedQuestion>,
}

/// On-disk bank: the array items plus the bank's name and scheme.
#[derive(Debug, Deserialize)]
struct SavedBank {
    #[serde(default, alias = "test_name")]
    name: Option<String>,
    #[serde(default)]
    marks: Option<Marks>,
    questions: Vec<Value>,
}

#[derive(Serialize)]
struct SavedBankRef<'a> {
    name: &'a str,
    marks: Marks,
    questions: Vec<IndexedQuestion>,
}

#[derive(Debug, Deserialize)]
struct KeyedQuestion {
    question: String,
    options: BTreeMap<String, String>,
    /// 1-based.
    correct_answer: i64,
}

/// Questions parsed from an import payload, not yet added to a bank.
#[derive(Debug, Clone)]
pub struct ParsedImport {
    /// Test name carried by a keyed-options payload. Importing it renames
    /// the bank.
    pub test_name: Option<String>,
    /// Name of a saved bank file.
    pub bank_name: Option<String>,
    /// Marking scheme of a saved bank file.
    pub scheme: Option<Marks>,
    pub questions: Vec<Question>,
}

/// How a payload should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// One of the JSON shapes.
    Structured,
    /// Numbered plain text.
    NumberedText,
}

impl ImportKind {
    /// Pick the importer for a file by its extension.
    pub fn from_path(path: &Path) -> SessionResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(ImportKind::Structured),
            "txt" | "text" | "md" => Ok(ImportKind::NumberedText),
            "pdf" | "doc" | "docx" => Err(SessionError::UnsupportedInput(format!(
                "{}: extract the text to a .txt file first",
                path.display()
            ))),
            _ => Err(SessionError::UnsupportedInput(format!(
                "{}: expected a .json or .txt file",
                path.display()
            ))),
        }
    }
}

/// Parse any of the JSON shapes. Missing marks take the saved scheme, or
/// `marks` when there is none.
pub fn parse_structured(raw: &str, marks: Marks) -> SessionResult<ParsedImport> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| SessionError::import_format(format!("not valid JSON: {e}")))?;

    match value {
        Value::Array(items) => Ok(ParsedImport {
            test_name: None,
            bank_name: None,
            scheme: None,
            questions: parse_indexed(items, marks)?,
        }),
        Value::Object(map) if is_saved_bank(&map) => {
            let saved: SavedBank = serde_json::from_value(Value::Object(map))
                .map_err(|e| SessionError::import_format(e.to_string()))?;
            let scheme = saved.marks.unwrap_or(marks);
            Ok(ParsedImport {
                test_name: None,
                bank_name: saved.name.filter(|n| !n.trim().is_empty()),
                scheme: saved.marks,
                questions: parse_indexed(saved.questions, scheme)?,
            })
        }
        Value::Object(map) if map.contains_key("questions") => {
            let test: NamedTest = serde_json::from_value(Value::Object(map))
                .map_err(|e| SessionError::import_format(e.to_string()))?;
            let questions = test
                .questions
                .into_iter()
                .enumerate()
                .map(|(i, q)| {
                    let options: Vec<String> = q.options.into_values().collect();
                    if q.correct_answer < 1 || q.correct_answer as usize > options.len() {
                        return Err(SessionError::import_format(format!(
                            "question {}: correct_answer {} is not between 1 and {}",
                            i + 1,
                            q.correct_answer,
                            options.len()
                        )));
                    }
                    let correct = (q.correct_answer - 1) as usize;
                    Question::new(q.question, options, correct, marks)
                        .map_err(|e| invalid_question(i, e))
                })
                .collect::<SessionResult<Vec<_>>>()?;
            Ok(ParsedImport {
                test_name: test.test_name.filter(|n| !n.trim().is_empty()),
                bank_name: None,
                scheme: None,
                questions,
            })
        }
        Value::Object(_) => Err(SessionError::import_format(
            "expected an array of questions or an object with a `questions` array",
        )),
        _ => Err(SessionError::import_format(
            "expected an array of questions",
        )),
    }
}

/// Array items with missing marks filled from `marks`.
fn parse_indexed(items: Vec<Value>, marks: Marks) -> SessionResult<Vec<Question>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let q: IndexedQuestion = serde_json::from_value(item)
                .map_err(|e| SessionError::import_format(format!("question {}: {e}", i + 1)))?;
            let marks = Marks {
                correct: q.marks.unwrap_or(marks.correct),
                wrong: q.negative_mark.unwrap_or(marks.wrong),
            };
            Question::new(q.question, q.options, q.correct_answer, marks)
                .map_err(|e| invalid_question(i, e))
        })
        .collect()
}

/// A saved bank has a `questions` array whose options are lists. Keyed
/// options mean the 1-based shape.
fn is_saved_bank(map: &serde_json::Map<String, Value>) -> bool {
    match map.get("questions").and_then(Value::as_array) {
        Some(questions) => !questions
            .iter()
            .any(|q| q.get("options").is_some_and(Value::is_object)),
        None => false,
    }
}

fn invalid_question(index: usize, err: SessionError) -> SessionError {
    match err {
        SessionError::Validation(msg) => {
            SessionError::import_format(format!("question {}: {msg}", index + 1))
        }
        other => other,
    }
}

/// Parse numbered plain text into questions.
///
/// Each block starts at a line like `3.` or `3)`. The rest of that line is
/// the prompt (or the next non-empty line when the number stands alone);
/// the next four non-empty lines become the options with any `a)` / `(b)` /
/// `C.` label removed. The first option is taken as correct.
pub fn parse_numbered_text(raw: &str, marks: Marks) -> SessionResult<Vec<Question>> {
    struct Block<'a> {
        number: &'a str,
        prompt: Option<&'a str>,
        options: Vec<&'a str>,
    }

    let mut blocks: Vec<Block<'_>> = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if let Some((number, rest)) = split_question_number(line) {
            blocks.push(Block {
                number,
                prompt: Some(rest).filter(|r| !r.is_empty()),
                options: Vec::new(),
            });
            continue;
        }
        if line.is_empty() {
            continue;
        }
        let Some(block) = blocks.last_mut() else {
            continue;
        };
        if block.prompt.is_none() {
            block.prompt = Some(line);
        } else if block.options.len() < TEXT_OPTION_COUNT {
            block.options.push(strip_option_label(line));
        }
    }

    if blocks.is_empty() {
        return Err(SessionError::import_format("no numbered questions found"));
    }

    blocks
        .into_iter()
        .map(|b| {
            let prompt = b.prompt.unwrap_or_default();
            if b.options.len() < TEXT_OPTION_COUNT {
                return Err(SessionError::import_format(format!(
                    "question {}: found {} option line(s), expected {TEXT_OPTION_COUNT}",
                    b.number,
                    b.options.len()
                )));
            }
            let options = b.options.into_iter().map(str::to_string).collect();
            Question::new(prompt, options, 0, marks).map_err(|e| match e {
                SessionError::Validation(msg) => {
                    SessionError::import_format(format!("question {}: {msg}", b.number))
                }
                other => other,
            })
        })
        .collect()
}

/// `"12. What is..."` -> `Some(("12", "What is..."))`.
fn split_question_number(line: &str) -> Option<(&str, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((&line[..digits], rest.trim()))
}

fn strip_option_label(line: &str) -> &str {
    let body = line.strip_prefix('(').unwrap_or(line);
    let mut chars = body.chars();
    if let (Some(label), Some(sep)) = (chars.next(), chars.next()) {
        if matches!(label.to_ascii_lowercase(), 'a'..='d') && matches!(sep, ')' | '.') {
            let rest = chars.as_str();
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest.trim();
            }
        }
    }
    line
}

/// Parse `raw` as `kind` and append the result to `bank`.
///
/// Returns the number of questions added. On error the bank is unchanged.
pub fn import_str(bank: &mut QuestionBank, raw: &str, kind: ImportKind) -> SessionResult<usize> {
    let questions = match kind {
        ImportKind::Structured => {
            let parsed = parse_structured(raw, bank.marks())?;
            if let Some(name) = parsed.test_name {
                bank.name = name;
            }
            parsed.questions
        }
        ImportKind::NumberedText => parse_numbered_text(raw, bank.marks())?,
    };
    let added = bank.extend(questions);
    tracing::info!(added, total = bank.len(), "imported questions");
    Ok(added)
}

/// Import a file into `bank`, choosing the importer by extension.
pub fn import_file(bank: &mut QuestionBank, path: &Path) -> Result<usize> {
    let kind = ImportKind::from_path(path)?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question file: {}", path.display()))?;
    let added = import_str(bank, &raw, kind)
        .with_context(|| format!("failed to import {}", path.display()))?;
    Ok(added)
}

/// Load a bank from a file.
///
/// A saved bank keeps its own name and scheme. Otherwise the bank is named
/// after the file (or the payload's test name) and uses `marks`.
pub fn load_bank(path: &Path, marks: Marks) -> Result<QuestionBank> {
    let kind = ImportKind::from_path(path)?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question file: {}", path.display()))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled test");

    let bank = match kind {
        ImportKind::Structured => {
            let parsed = parse_structured(&raw, marks)
                .with_context(|| format!("failed to import {}", path.display()))?;
            let name = parsed
                .bank_name
                .or(parsed.test_name)
                .unwrap_or_else(|| stem.to_string());
            QuestionBank::from_questions(name, parsed.questions)
                .with_marks(parsed.scheme.unwrap_or(marks))
        }
        ImportKind::NumberedText => {
            let questions = parse_numbered_text(&raw, marks)
                .with_context(|| format!("failed to import {}", path.display()))?;
            QuestionBank::from_questions(stem, questions).with_marks(marks)
        }
    };
    tracing::debug!(path = %path.display(), questions = bank.len(), "bank loaded");
    Ok(bank)
}

fn indexed_items(bank: &QuestionBank) -> Vec<IndexedQuestion> {
    bank.iter()
        .map(|q| IndexedQuestion {
            question: q.prompt().to_string(),
            options: q.options().to_vec(),
            correct_answer: q.correct_answer(),
            marks: Some(q.marks().correct),
            negative_mark: Some(q.marks().wrong),
        })
        .collect()
}

/// Serialize a bank's questions in the 0-based array shape, marks included.
pub fn export_json(bank: &QuestionBank) -> SessionResult<String> {
    serde_json::to_string_pretty(&indexed_items(bank))
        .map_err(|e| SessionError::import_format(format!("failed to serialize bank: {e}")))
}

/// Serialize a bank as a saved bank: name, scheme and the array items.
pub fn export_bank_file(bank: &QuestionBank) -> SessionResult<String> {
    let saved = SavedBankRef {
        name: &bank.name,
        marks: bank.marks(),
        questions: indexed_items(bank),
    };
    serde_json::to_string_pretty(&saved)
        .map_err(|e| SessionError::import_format(format!("failed to serialize bank: {e}")))
}

/// Write a bank to `path` as a saved bank.
pub fn save_bank(bank: &QuestionBank, path: &Path) -> Result<()> {
    let json = export_bank_file(bank)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write bank to {}", path.display()))?;
    Ok(())
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// 0-based question index (if applicable).
    pub question: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Check a bank for common authoring mistakes.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.is_empty() {
        warnings.push(ValidationWarning {
            question: None,
            message: "bank has no questions".into(),
        });
    }

    let mut seen = HashSet::new();
    for (i, q) in bank.iter().enumerate() {
        if !seen.insert(q.prompt().trim().to_lowercase()) {
            warnings.push(ValidationWarning {
                question: Some(i),
                message: format!("duplicate question: {}", q.prompt()),
            });
        }
    }

    for (i, q) in bank.iter().enumerate() {
        let distinct: HashSet<_> = q.options().iter().map(|o| o.trim()).collect();
        if distinct.len() != q.option_count() {
            warnings.push(ValidationWarning {
                question: Some(i),
                message: "options are not distinct".into(),
            });
        }
    }

    for (i, q) in bank.iter().enumerate() {
        if q.option_count() != TEXT_OPTION_COUNT {
            warnings.push(ValidationWarning {
                question: Some(i),
                message: format!("has {} options instead of 4", q.option_count()),
            });
        }
    }

    // A positive wrong mark still gets added, which is rarely intended.
    for (i, q) in bank.iter().enumerate() {
        if q.marks().wrong > 0.0 {
            warnings.push(ValidationWarning {
                question: Some(i),
                message: format!("wrong answers earn +{} marks", q.marks().wrong),
            });
        }
    }

    warnings
}
