//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Estimate daily development time per project from git history.
///
/// Reads every configured repository's commits for one day and asks Gemini
/// to estimate the time spent, falling back to a line-count heuristic.
#[derive(Debug, Parser)]
#[command(name = "timekeep", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Estimate time spent on every project for one day.
    Day {
        /// Day to analyze (YYYY-MM-DD, YYYY/MM/DD, DD-MM-YYYY or DD/MM/YYYY).
        /// Defaults to today.
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List configured projects and whether they can be analyzed.
    Projects,
}
