//! Running `git log` for a project's day window.

use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use tk_core::{CommitRecord, LogQuery, parse_log};
use tokio::process::Command;

/// Upper bound on one git invocation.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("git exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("git timed out after {0:?}")]
    Timeout(Duration),
}

/// Whether `path` is the root of a git working tree.
pub fn is_repository(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Raw log output for the query, run inside `repo`.
pub async fn day_log(repo: &Path, query: &LogQuery<'_>) -> Result<String, GitError> {
    let args = query.args();
    tracing::debug!(repo = %repo.display(), ?args, "running git log");

    let mut command = Command::new("git");
    command.args(&args).current_dir(repo).kill_on_drop(true);

    let output = tokio::time::timeout(GIT_TIMEOUT, command.output())
        .await
        .map_err(|_| GitError::Timeout(GIT_TIMEOUT))?
        .map_err(GitError::Spawn)?;

    if !output.status.success() {
        return Err(GitError::Failed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Unique non-merge commits from every branch on `day`.
pub async fn commits_for_day(
    repo: &Path,
    day: NaiveDate,
    author_email: Option<&str>,
) -> Result<Vec<CommitRecord>, GitError> {
    let query = LogQuery::new(day, author_email);
    let output = day_log(repo, &query).await?;
    Ok(parse_log(&output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_directory_is_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_repository(dir.path()));
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(is_repository(dir.path()));
    }

    #[tokio::test]
    async fn git_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        // No repository here, so git exits non-zero (or cannot be spawned).
        let result = commits_for_day(dir.path(), day, None).await;
        assert!(matches!(
            result,
            Err(GitError::Failed { .. } | GitError::Spawn(_))
        ));
    }
}
