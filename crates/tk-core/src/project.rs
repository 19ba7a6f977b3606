//! Configured projects and the per-day reports built for them.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::estimate::EstimationResult;

/// A repository to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub path: PathBuf,
    /// Only count commits by this author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            author_email: None,
        }
    }

    #[must_use]
    pub fn with_author_email(mut self, email: impl Into<String>) -> Self {
        self.author_email = Some(email.into());
        self
    }

    /// The author filter, ignoring blank values.
    pub fn author_filter(&self) -> Option<&str> {
        self.author_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// An estimation result tagged with the project it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub name: String,
    pub path: PathBuf,
    /// Unique commits analyzed.
    pub commits: usize,
    #[serde(flatten)]
    pub estimate: EstimationResult,
}

impl ProjectReport {
    pub fn new(project: &ProjectConfig, commits: usize, estimate: EstimationResult) -> Self {
        Self {
            name: project.name.clone(),
            path: project.path.clone(),
            commits,
            estimate,
        }
    }

    /// A report for a project that could not be analyzed.
    pub fn failed(project: &ProjectConfig, error: impl Into<String>) -> Self {
        Self::new(project, 0, EstimationResult::failed(error))
    }

    pub const fn error(&self) -> Option<&String> {
        self.estimate.error.as_ref()
    }

    pub const fn is_success(&self) -> bool {
        self.estimate.error.is_none()
    }
}

/// All project reports for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub date: NaiveDate,
    /// In configuration order.
    pub projects: Vec<ProjectReport>,
    /// Sum over reports without an error.
    pub total_hours: f64,
}

impl DayReport {
    pub fn new(date: NaiveDate, projects: Vec<ProjectReport>) -> Self {
        let total_hours = projects
            .iter()
            .filter(|report| report.is_success())
            .map(|report| report.estimate.total_hours)
            .fold(0.0, |total, hours| total + hours);
        Self {
            date,
            projects,
            total_hours,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.projects.iter().filter(|r| !r.is_success()).count()
    }
}
