//! Command-line argument parsing for BakeBuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::types::FeedbackSignal;

/// BakeBuddy - ask for baking recipes from your own recipe collection
#[derive(Parser, Debug)]
#[command(name = "bakebuddy")]
#[command(version)]
#[command(about = "Retrieval-augmented baking recipe assistant", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Answer one question and print the result
    Ask {
        /// The baking question
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Evaluator model override
        #[arg(short, long)]
        model: Option<String>,

        /// Print the full conversation record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive chat session
    Chat,

    /// Load a JSON recipe dataset into the index
    Ingest {
        /// Path to the recipe JSON array
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Create the conversation database tables
    InitDb {
        /// Drop existing tables first
        #[arg(long)]
        reset: bool,
    },

    /// Record feedback for a stored conversation
    Feedback {
        /// Conversation id
        #[arg(value_name = "ID")]
        id: String,

        #[arg(value_enum)]
        signal: SignalArg,
    },

    /// Display current configuration
    Config,
}

/// Feedback value as typed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SignalArg {
    Helpful,
    NotHelpful,
    Neutral,
}

impl From<SignalArg> for FeedbackSignal {
    fn from(arg: SignalArg) -> Self {
        match arg {
            SignalArg::Helpful => FeedbackSignal::Helpful,
            SignalArg::NotHelpful => FeedbackSignal::NotHelpful,
            SignalArg::Neutral => FeedbackSignal::Neutral,
        }
    }
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Default log filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "bakebuddy=info,warn",
            Verbosity::VeryVerbose => "bakebuddy=debug,info",
        }
    }

    /// Check if should show the spinner
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
