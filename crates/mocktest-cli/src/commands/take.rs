//! The `mocktest take` command: an interactive, timed attempt.
//!
//! Input is read line by line from stdin while a [`Ticker`] counts seconds
//! against the question on screen. The ticker only exists while the attempt
//! is in progress.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufReadExt, BufReader};

use mocktest_core::config::{load_config_from, MocktestConfig};
use mocktest_core::error::SessionError;
use mocktest_core::model::QuestionBank;
use mocktest_core::parser::load_bank;
use mocktest_core::report::AttemptReport;
use mocktest_core::scoring::Outcome;
use mocktest_core::session::{Phase, QuestionStatus, SessionController};
use mocktest_core::timing::{format_clock, Tick, Ticker};
use mocktest_report::html::write_html_report;

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Start,
    /// 0-based option.
    Answer(usize),
    Clear,
    Next,
    Skip,
    Prev,
    /// 0-based question.
    Goto(usize),
    Submit,
    Reset,
    Show,
    Help,
    Quit,
}

/// Report files written after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Json,
    Html,
    Markdown,
}

/// What the loop should do after a command.
enum Flow {
    Continue,
    Submitted,
    Quit,
}

pub async fn execute(
    bank_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let formats = parse_formats(&format)?;
    let output = output.unwrap_or_else(|| config.report_dir.clone());

    let bank = match bank_path.as_ref().or(config.default_bank.as_ref()) {
        Some(path) => load_bank(path, config.marks())?,
        None => QuestionBank::sample(),
    };
    tracing::debug!(bank = %bank.name, questions = bank.len(), "bank loaded");

    let mut session = SessionController::new(bank);
    print_intro(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker: Option<Ticker> = None;

    prompt();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                match handle_line(&mut session, line.trim()) {
                    Flow::Continue => {}
                    Flow::Submitted => {
                        print_results(&session);
                        write_reports(&session, &formats, &output)?;
                    }
                    Flow::Quit => break,
                }
            }
            Some(_) = next_tick(&mut ticker) => {
                session.tick();
                continue;
            }
        }
        sync_ticker(&mut session, &mut ticker, &config);
        prompt();
    }

    if session.phase() == Phase::InProgress {
        println!(
            "\nAttempt abandoned after {} ({} of {} answered).",
            format_clock(session.elapsed_seconds()),
            session.answers().len(),
            session.bank().len()
        );
    }
    Ok(())
}

/// Keep a ticker running exactly while the attempt is in progress.
fn sync_ticker(session: &mut SessionController, ticker: &mut Option<Ticker>, config: &MocktestConfig) {
    if session.take_reset_signal() {
        if let Some(mut old) = ticker.take() {
            old.stop();
        }
    }
    match (session.is_started(), ticker.is_some()) {
        (true, false) => *ticker = Some(Ticker::spawn(config.tick_interval())),
        (false, true) => {
            if let Some(mut old) = ticker.take() {
                old.stop();
            }
        }
        _ => {}
    }
}

async fn next_tick(ticker: &mut Option<Ticker>) -> Option<Tick> {
    match ticker {
        Some(t) => t.next().await,
        None => std::future::pending().await,
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn handle_line(session: &mut SessionController, line: &str) -> Flow {
    if line.is_empty() {
        return Flow::Continue;
    }
    let input = match parse_input(line) {
        Ok(input) => input,
        Err(msg) => {
            println!("{msg}");
            return Flow::Continue;
        }
    };

    match apply(session, input) {
        Ok(flow) => flow,
        Err(e) => {
            tracing::debug!(kind = %e.kind(), "{e}");
            println!("! {e}");
            Flow::Continue
        }
    }
}

fn apply(session: &mut SessionController, input: Input) -> Result<Flow, SessionError> {
    match input {
        Input::Start => {
            session.start()?;
            print_question(session);
        }
        Input::Answer(option) => {
            session.record_answer(option)?;
            print_question(session);
        }
        Input::Clear => {
            session.clear_answer()?;
            print_question(session);
        }
        Input::Next => {
            session.save_and_next()?;
            print_question(session);
        }
        Input::Skip => {
            session.skip()?;
            print_question(session);
        }
        Input::Prev => {
            session.previous()?;
            print_question(session);
        }
        Input::Goto(question) => {
            session.navigate_to(question)?;
            print_question(session);
        }
        Input::Submit => {
            session.submit()?;
            return Ok(Flow::Submitted);
        }
        Input::Reset => {
            session.reset();
            println!("Attempt reset.");
            print_intro(session);
        }
        Input::Show => {
            if session.phase() == Phase::NotStarted {
                print_intro(session);
            } else {
                print_question(session);
            }
        }
        Input::Help => print_help(),
        Input::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn parse_input(line: &str) -> Result<Input, String> {
    let lower = line.to_ascii_lowercase();
    let mut words = lower.split_whitespace();
    let head = words.next().unwrap_or_default();
    let arg = words.next();

    let input = match (head, arg) {
        ("start", None) => Input::Start,
        ("clear", None) => Input::Clear,
        ("next", None) => Input::Next,
        ("skip", None) => Input::Skip,
        ("prev" | "previous", None) => Input::Prev,
        ("submit", None) => Input::Submit,
        ("reset", None) => Input::Reset,
        ("show", None) => Input::Show,
        ("help" | "?", None) => Input::Help,
        ("quit" | "exit", None) => Input::Quit,
        ("goto", Some(n)) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => Input::Goto(n - 1),
            _ => return Err(format!("'{n}' is not a question number")),
        },
        ("goto", None) => return Err("usage: goto N".to_string()),
        (word, None) => {
            if let Ok(n) = word.parse::<usize>() {
                if n == 0 {
                    return Err("options are numbered from 1".to_string());
                }
                Input::Answer(n - 1)
            } else if let [c @ b'a'..=b'z'] = word.as_bytes() {
                Input::Answer(usize::from(c - b'a'))
            } else {
                return Err(format!("unknown command '{line}'. Type 'help' for commands."));
            }
        }
        _ => return Err(format!("unknown command '{line}'. Type 'help' for commands.")),
    };
    Ok(input)
}

fn parse_formats(raw: &str) -> Result<Vec<ReportFormat>> {
    let mut formats = Vec::new();
    for part in raw.split(',').map(str::trim) {
        match part {
            "all" => return Ok(vec![ReportFormat::Json, ReportFormat::Html, ReportFormat::Markdown]),
            "none" => return Ok(Vec::new()),
            "json" => formats.push(ReportFormat::Json),
            "html" => formats.push(ReportFormat::Html),
            "markdown" | "md" => formats.push(ReportFormat::Markdown),
            other => anyhow::bail!(
                "unknown format '{other}'. Use: json, html, markdown, all, none"
            ),
        }
    }
    formats.dedup();
    Ok(formats)
}

fn print_intro(session: &SessionController) {
    let bank = session.bank();
    println!(
        "{} | {} questions | {:+.2} per correct answer, {:+.2} per wrong answer",
        bank.name,
        bank.len(),
        bank.marks().correct,
        bank.marks().wrong
    );
    println!("Type 'start' to begin or 'help' for commands.");
}

fn print_help() {
    println!("Commands:");
    println!("  start          begin the attempt and start the clock");
    println!("  1..N or a..z   select an option for the current question");
    println!("  clear          remove the answer to the current question");
    println!("  next           save the answer and go to the next question");
    println!("  skip           go to the next question without answering");
    println!("  prev           go to the previous question");
    println!("  goto N         jump to question N");
    println!("  submit         finish and grade the attempt");
    println!("  reset          discard the attempt and start over");
    println!("  show           show the current question again");
    println!("  quit           leave without submitting");
}

fn print_question(session: &SessionController) {
    let Some(question) = session.current_question() else {
        return;
    };
    let index = session.current_index();
    let selected = session.answer(index);
    let submitted = session.is_submitted();

    println!();
    println!(
        "Question {}/{}  [{}]",
        index + 1,
        session.bank().len(),
        format_clock(session.elapsed_seconds())
    );
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        let chosen = if selected == Some(i) { '>' } else { ' ' };
        let key = if submitted && question.is_correct(i) {
            " (correct)"
        } else {
            ""
        };
        println!(" {chosen} {}) {option}{key}", i + 1);
    }
    println!("{}", status_strip(session));
}

/// One marker per question: `*` answered, `+` correct, `x` wrong, `-`
/// skipped, blank otherwise. The current question is bracketed.
fn status_strip(session: &SessionController) -> String {
    (0..session.bank().len())
        .map(|i| {
            let mark = match session.question_status(i) {
                Some(QuestionStatus::Answered) => '*',
                Some(QuestionStatus::Graded(Outcome::Correct)) => '+',
                Some(QuestionStatus::Graded(Outcome::Wrong)) => 'x',
                Some(QuestionStatus::Graded(Outcome::Skipped)) => '-',
                Some(QuestionStatus::Unanswered) | None => ' ',
            };
            if i == session.current_index() {
                format!("[{}{mark}]", i + 1)
            } else {
                format!(" {}{mark} ", i + 1)
            }
        })
        .collect::<Vec<_>>()
        .join("")
}

fn print_results(session: &SessionController) {
    let (Some(card), Ok(summary)) = (session.score_card(), session.summary()) else {
        return;
    };

    let mut table = Table::new();
    table.set_header(vec!["Score", "Correct", "Wrong", "Skipped", "Accuracy", "Time"]);
    table.add_row(vec![
        Cell::new(format!("{} / {:.2}", card.total_display(), card.max_score)),
        Cell::new(card.correct_count),
        Cell::new(card.wrong_count),
        Cell::new(card.skipped_count),
        Cell::new(format!("{:.1}%", summary.accuracy_pct)),
        Cell::new(format_clock(summary.elapsed_seconds)),
    ]);

    println!("\nTest submitted.");
    println!("{table}");
    println!("Average per question: {:.1}s", summary.average_seconds);
    if let (Some(fastest), Some(slowest)) = (summary.fastest, summary.slowest) {
        println!(
            "Fastest: question {} ({}s) | Slowest: question {} ({}s)",
            fastest.index + 1,
            fastest.seconds,
            slowest.index + 1,
            slowest.seconds
        );
    }
    println!("Type 'goto N' to review a question, 'reset' to try again or 'quit' to leave.");
}

fn write_reports(session: &SessionController, formats: &[ReportFormat], output: &Path) -> Result<()> {
    if formats.is_empty() {
        return Ok(());
    }
    let report = AttemptReport::from_session(session)?;

    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");

    for fmt in formats {
        match fmt {
            ReportFormat::Json => {
                let path = output.join(format!("attempt-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            ReportFormat::Html => {
                let path = output.join(format!("attempt-{timestamp}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            ReportFormat::Markdown => {
                let path = output.join(format!("attempt-{timestamp}.md"));
                std::fs::write(&path, report.to_markdown())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Markdown report: {}", path.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("start"), Ok(Input::Start));
        assert_eq!(parse_input("NEXT"), Ok(Input::Next));
        assert_eq!(parse_input("goto 3"), Ok(Input::Goto(2)));
        assert_eq!(parse_input("quit"), Ok(Input::Quit));
    }

    #[test]
    fn parses_answers() {
        assert_eq!(parse_input("1"), Ok(Input::Answer(0)));
        assert_eq!(parse_input("4"), Ok(Input::Answer(3)));
        assert_eq!(parse_input("c"), Ok(Input::Answer(2)));
        assert_eq!(parse_input("B"), Ok(Input::Answer(1)));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_input("0").is_err());
        assert!(parse_input("goto").is_err());
        assert!(parse_input("goto 0").is_err());
        assert!(parse_input("goto x").is_err());
        assert!(parse_input("dance").is_err());
        assert!(parse_input("start now").is_err());
    }

    #[test]
    fn report_formats() {
        assert_eq!(parse_formats("json").unwrap(), vec![ReportFormat::Json]);
        assert!(parse_formats("none").unwrap().is_empty());
        assert_eq!(parse_formats("all").unwrap().len(), 3);
        assert_eq!(
            parse_formats("html, md").unwrap(),
            vec![ReportFormat::Html, ReportFormat::Markdown]
        );
        assert!(parse_formats("sarif").is_err());
    }

    #[test]
    fn session_errors_keep_the_loop_running() {
        let mut session = SessionController::new(QuestionBank::sample());
        assert!(matches!(handle_line(&mut session, "next"), Flow::Continue));
        assert!(matches!(handle_line(&mut session, "start"), Flow::Continue));
        assert!(matches!(handle_line(&mut session, "next"), Flow::Continue));
        assert_eq!(session.current_index(), 0);
        assert!(matches!(handle_line(&mut session, "3"), Flow::Continue));
        assert!(matches!(handle_line(&mut session, "submit"), Flow::Submitted));
        assert!(matches!(handle_line(&mut session, "quit"), Flow::Quit));
    }

    #[test]
    fn status_strip_marks_current_and_answered() {
        let mut session = SessionController::new(QuestionBank::sample());
        session.start().unwrap();
        session.record_answer(2).unwrap();
        session.skip().unwrap();
        assert_eq!(status_strip(&session), " 1* [2 ] 3  ");
    }
}
