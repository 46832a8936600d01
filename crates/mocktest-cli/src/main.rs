//! mocktest CLI, the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mocktest", version, about = "Timed multiple-choice mock tests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a test interactively
    Take {
        /// Question bank (.json or .txt); the built-in sample when omitted
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for attempt reports (default: report_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report format: json, html, markdown, all, none (comma-separated)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Check a question bank for problems
    Validate {
        /// Path to the bank file
        #[arg(long)]
        bank: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Edit a question bank file
    Bank {
        #[command(subcommand)]
        action: BankAction,
    },

    /// Render a saved attempt report
    Report {
        /// Attempt report JSON
        #[arg(long)]
        input: PathBuf,

        /// Output format: markdown, html
        #[arg(long, default_value = "markdown")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create a starter config and sample bank
    Init,
}

/// The bank file an editor command works on.
#[derive(Args)]
pub struct BankTarget {
    /// Bank file (.json)
    #[arg(long)]
    pub file: PathBuf,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum BankAction {
    /// List the questions in a bank
    List {
        #[command(flatten)]
        target: BankTarget,
    },

    /// Add a question (creates the bank file if needed)
    Add {
        #[command(flatten)]
        target: BankTarget,

        /// Question text
        #[arg(long)]
        question: String,

        /// Answer option; repeat for each option
        #[arg(long = "option", required = true)]
        options: Vec<String>,

        /// Correct option, 1-based
        #[arg(long)]
        correct: usize,

        /// Marks for a correct answer (default: bank scheme)
        #[arg(long)]
        marks: Option<f64>,

        /// Marks for a wrong answer (default: bank scheme)
        #[arg(long, allow_hyphen_values = true)]
        negative_mark: Option<f64>,
    },

    /// Delete a question
    Delete {
        #[command(flatten)]
        target: BankTarget,

        /// Question number, 1-based
        #[arg(long)]
        index: usize,
    },

    /// Remove every question
    Clear {
        #[command(flatten)]
        target: BankTarget,
    },

    /// Set the marking scheme of every question
    Marks {
        #[command(flatten)]
        target: BankTarget,

        /// Marks for a correct answer
        #[arg(long)]
        correct: f64,

        /// Marks for a wrong answer
        #[arg(long, allow_hyphen_values = true)]
        wrong: f64,
    },

    /// Append questions from a .json or .txt file
    Import {
        #[command(flatten)]
        target: BankTarget,

        /// File to import
        #[arg(long)]
        from: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mocktest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            bank,
            config,
            output,
            format,
        } => commands::take::execute(bank, config, output, format).await,
        Commands::Validate { bank, config } => commands::validate::execute(bank, config),
        Commands::Bank { action } => commands::bank::execute(action),
        Commands::Report {
            input,
            format,
            output,
        } => commands::report::execute(input, format, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
