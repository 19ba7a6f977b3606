//! Per-project analysis and the concurrent day run.

use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use futures::future::join_all;
use tk_core::{DayReport, EstimationResult, ProjectConfig, ProjectReport};
use tk_llm::{EstimationBackend, Orchestrator};

use crate::git;

/// Whether a project path can be analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    Ready,
    MissingPath,
    NotRepository,
}

impl ProjectStatus {
    pub fn check(path: &Path) -> Self {
        if !path.exists() {
            Self::MissingPath
        } else if !git::is_repository(path) {
            Self::NotRepository
        } else {
            Self::Ready
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ok",
            Self::MissingPath => "path does not exist",
            Self::NotRepository => "not a repository",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Analyzes one project for one day.
#[derive(Debug)]
pub struct ProjectAnalyzer<B> {
    orchestrator: Orchestrator<B>,
}

impl<B: EstimationBackend> ProjectAnalyzer<B> {
    pub const fn new(orchestrator: Orchestrator<B>) -> Self {
        Self { orchestrator }
    }

    /// Never fails; problems are reported on the returned report.
    pub async fn analyze(&self, project: &ProjectConfig, day: NaiveDate) -> ProjectReport {
        let path = &project.path;
        match ProjectStatus::check(path) {
            ProjectStatus::MissingPath => {
                return ProjectReport::failed(
                    project,
                    format!("Path does not exist: {}", path.display()),
                );
            }
            ProjectStatus::NotRepository => {
                return ProjectReport::failed(
                    project,
                    format!("Not a git repository: {}", path.display()),
                );
            }
            ProjectStatus::Ready => {}
        }

        let author = project.author_filter();
        let commits = match git::commits_for_day(path, day, author).await {
            Ok(commits) => commits,
            Err(err) => {
                tracing::warn!(project = %project.name, error = %err, "git log failed");
                return ProjectReport::failed(project, format!("git log failed: {err}"));
            }
        };

        if commits.is_empty() {
            let summary = author.map_or_else(
                || "No commits".to_string(),
                |email| format!("No commits by {email}"),
            );
            return ProjectReport::new(project, 0, EstimationResult::zero(summary));
        }

        tracing::debug!(project = %project.name, commits = commits.len(), "estimating");
        let estimate = self.orchestrator.estimate_batch(&commits).await;
        ProjectReport::new(project, commits.len(), estimate.into_result())
    }

    /// Analyzes every project concurrently and totals the day.
    ///
    /// Reports keep the order of `projects`.
    pub async fn run_day(&self, projects: &[ProjectConfig], day: NaiveDate) -> DayReport {
        let reports = join_all(projects.iter().map(|project| self.analyze(project, day))).await;
        DayReport::new(day, reports)
    }
}
