//! The `mocktest bank` command: editor operations on a bank file.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use mocktest_core::config::load_config_from;
use mocktest_core::model::{Marks, QuestionBank, QuestionDraft};
use mocktest_core::parser::{import_file, load_bank, save_bank};

use crate::{BankAction, BankTarget};

pub fn execute(action: BankAction) -> Result<()> {
    match action {
        BankAction::List { target } => {
            let bank = open(&target, false)?;
            print_bank(&bank);
        }
        BankAction::Add {
            target,
            question,
            options,
            correct,
            marks,
            negative_mark,
        } => {
            anyhow::ensure!(correct >= 1, "--correct is 1-based");
            let mut bank = open(&target, true)?;
            let scheme = bank.marks();
            let marks = (marks.is_some() || negative_mark.is_some()).then(|| Marks {
                correct: marks.unwrap_or(scheme.correct),
                wrong: negative_mark.unwrap_or(scheme.wrong),
            });
            let index = bank.add_question(QuestionDraft {
                prompt: question,
                options,
                correct_answer: correct - 1,
                marks,
            })?;
            save_bank(&bank, &target.file)?;
            println!(
                "Added question {} to {} ({} total)",
                index + 1,
                target.file.display(),
                bank.len()
            );
        }
        BankAction::Delete { target, index } => {
            anyhow::ensure!(index >= 1, "--index is 1-based");
            let mut bank = open(&target, false)?;
            let removed = bank.delete_question(index - 1)?;
            save_bank(&bank, &target.file)?;
            println!("Deleted question {index}: {}", removed.prompt());
        }
        BankAction::Clear { target } => {
            let mut bank = open(&target, false)?;
            let count = bank.len();
            bank.clear_all();
            save_bank(&bank, &target.file)?;
            println!("Removed {count} question(s) from {}", target.file.display());
        }
        BankAction::Marks {
            target,
            correct,
            wrong,
        } => {
            let mut bank = open(&target, false)?;
            bank.bulk_set_marks(correct, wrong)?;
            save_bank(&bank, &target.file)?;
            println!(
                "Set marks to {correct:+.2} / {wrong:+.2} on {} question(s)",
                bank.len()
            );
        }
        BankAction::Import { target, from } => {
            let mut bank = open(&target, true)?;
            let added = import_file(&mut bank, &from)?;
            save_bank(&bank, &target.file)?;
            println!(
                "Imported {added} question(s) from {} ({} total)",
                from.display(),
                bank.len()
            );
        }
    }
    Ok(())
}

/// Load the target bank. A missing file is an empty bank when `create` is
/// set and an error otherwise.
fn open(target: &BankTarget, create: bool) -> Result<QuestionBank> {
    let is_json = target
        .file
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    anyhow::ensure!(
        is_json,
        "bank files are stored as JSON; use a .json path instead of {}",
        target.file.display()
    );

    let config = load_config_from(target.config.as_deref())?;
    if target.file.exists() {
        return load_bank(&target.file, config.marks());
    }
    anyhow::ensure!(create, "bank file not found: {}", target.file.display());
    tracing::debug!(path = %target.file.display(), "starting a new bank");
    Ok(QuestionBank::new(stem(&target.file)).with_marks(config.marks()))
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled test")
        .to_string()
}

fn print_bank(bank: &QuestionBank) {
    if bank.is_empty() {
        println!("{} has no questions.", bank.name);
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Options", "Correct", "Marks"]);

    for (i, q) in bank.iter().enumerate() {
        let marks = q.marks();
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(q.prompt()),
            Cell::new(q.option_count()),
            Cell::new(&q.options()[q.correct_answer()]),
            Cell::new(format!("{:+.2} / {:+.2}", marks.correct, marks.wrong)),
        ]);
    }

    println!("{} ({} questions)", bank.name, bank.len());
    println!("{table}");
}
