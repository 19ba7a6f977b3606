//! Commit records produced from a day's git history.

use serde::{Deserialize, Serialize};

/// One non-merge commit inside the analysis window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash.
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    /// Author time in seconds since the Unix epoch.
    pub timestamp: i64,
    /// Subject line.
    pub message: String,
    /// Number of numstat lines attributed to this commit.
    pub files_changed: usize,
    /// Added lines; binary files contribute zero.
    pub additions: u64,
    /// Deleted lines; binary files contribute zero.
    pub deletions: u64,
}

impl CommitRecord {
    /// Starts a record with empty file statistics.
    pub fn new(
        hash: impl Into<String>,
        author_name: impl Into<String>,
        author_email: impl Into<String>,
        timestamp: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            author_name: author_name.into(),
            author_email: author_email.into(),
            timestamp,
            message: message.into(),
            files_changed: 0,
            additions: 0,
            deletions: 0,
        }
    }

    /// Added plus deleted lines.
    pub const fn changed_lines(&self) -> u64 {
        self.additions.saturating_add(self.deletions)
    }

    /// First eight characters of the hash.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }
}

/// Sum of changed lines across a batch.
pub fn total_changed_lines(commits: &[CommitRecord]) -> u64 {
    commits
        .iter()
        .fold(0, |acc, commit| acc.saturating_add(commit.changed_lines()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_truncates_long_hashes() {
        let commit = CommitRecord::new("0123456789abcdef", "me", "me@example.com", 0, "msg");
        assert_eq!(commit.short_hash(), "01234567");
    }

    #[test]
    fn short_hash_keeps_short_hashes() {
        let commit = CommitRecord::new("abc123", "me", "me@example.com", 0, "msg");
        assert_eq!(commit.short_hash(), "abc123");
    }

    #[test]
    fn total_changed_lines_sums_additions_and_deletions() {
        let mut a = CommitRecord::new("a", "me", "me@example.com", 0, "one");
        a.additions = 10;
        a.deletions = 5;
        let mut b = CommitRecord::new("b", "me", "me@example.com", 0, "two");
        b.additions = 1;
        assert_eq!(total_changed_lines(&[a, b]), 16);
        assert_eq!(total_changed_lines(&[]), 0);
    }
}
