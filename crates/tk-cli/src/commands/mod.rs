//! CLI subcommand implementations.

pub mod day;
pub mod projects;
pub mod util;
