//! Timekeep CLI library.
//!
//! This crate provides the CLI interface plus the I/O side of the pipeline:
//! running git, analyzing projects and the concurrent day run.

pub mod analyzer;
mod cli;
pub mod commands;
pub mod config;
pub mod git;

pub use analyzer::{ProjectAnalyzer, ProjectStatus};
pub use cli::{Cli, Commands};
pub use config::Config;
