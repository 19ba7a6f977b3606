//! Core domain logic for timekeep.
//!
//! This crate contains the pure parts of the pipeline:
//! - Log parsing: turning a day's `git log --numstat` stream into unique commits
//! - Estimation policy: fallback estimates and normalization of hour figures
//! - Reports: per-project results and the day total

pub mod commit;
pub mod estimate;
pub mod log;
pub mod project;

pub use commit::{CommitRecord, total_changed_lines};
pub use estimate::{
    Estimation, EstimationPolicy, EstimationResult, FailureCategory, FallbackPolicy, TaskEstimate,
};
pub use log::{LogParser, LogQuery, parse_log};
pub use project::{DayReport, ProjectConfig, ProjectReport};
