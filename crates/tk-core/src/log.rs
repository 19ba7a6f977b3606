//! Git log query construction and stream parsing.
//!
//! The query asks git for one boundary line per commit followed by its
//! `--numstat` lines:
//!
//! ```text
//! COMMIT_BOUNDARY|||<hash>|||<author>|||<email>|||<epoch>|||<subject>
//! <added>\t<deleted>\t<path>
//! ```
//!
//! Parsing is a reducer over lines with an explicit state. A commit is
//! finalized when the next boundary arrives or the stream ends, and only if
//! its hash has not been emitted before. `--all` can report the same commit
//! once per branch containing it; the first block wins.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::commit::CommitRecord;

/// Literal that starts every commit boundary line.
pub const BOUNDARY_PREFIX: &str = "COMMIT_BOUNDARY|||";

/// Separator between boundary fields.
pub const FIELD_DELIMITER: &str = "|||";

/// `--format` argument producing boundary lines. The subject comes last so
/// delimiters inside it stay part of the message.
pub const LOG_FORMAT: &str = "--format=COMMIT_BOUNDARY|||%H|||%an|||%ae|||%at|||%s";

/// Placeholder git prints instead of line counts for binary files.
const BINARY_MARKER: &str = "-";

const BOUNDARY_FIELDS: usize = 5;

/// A `git log` invocation covering one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery<'a> {
    pub day: NaiveDate,
    /// Restrict to commits whose author matches this email.
    pub author_email: Option<&'a str>,
}

impl<'a> LogQuery<'a> {
    pub const fn new(day: NaiveDate, author_email: Option<&'a str>) -> Self {
        Self { day, author_email }
    }

    /// Start of the window, `YYYY-MM-DD 00:00:00` local time.
    pub fn since(&self) -> String {
        format!("{} 00:00:00", self.day.format("%Y-%m-%d"))
    }

    /// End of the window, `YYYY-MM-DD 23:59:59` local time (inclusive).
    pub fn until(&self) -> String {
        format!("{} 23:59:59", self.day.format("%Y-%m-%d"))
    }

    /// Arguments to pass to `git`, without the program name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "log".to_string(),
            "--all".to_string(),
            "--no-merges".to_string(),
            format!("--since={}", self.since()),
            format!("--until={}", self.until()),
            LOG_FORMAT.to_string(),
            "--numstat".to_string(),
        ];
        // Git matches `--author` against `Name <email>`; the bracketed
        // literal only matches the whole email.
        if let Some(email) = self.author_email {
            args.push("--fixed-strings".to_string());
            args.push(format!("--author=<{email}>"));
        }
        args
    }
}

#[derive(Debug, Default)]
enum ParseState {
    #[default]
    Idle,
    Accumulating(CommitRecord),
    /// The last boundary was malformed; its stat lines are skipped.
    Discarding,
}

/// Incremental parser for the log stream.
#[derive(Debug, Default)]
pub struct LogParser {
    state: ParseState,
    seen: HashSet<String>,
    commits: Vec<CommitRecord>,
}

impl LogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line of output.
    pub fn push_line(&mut self, line: &str) {
        if let Some(fields) = line.strip_prefix(BOUNDARY_PREFIX) {
            self.finalize_current();
            self.state = match parse_boundary(fields) {
                Some(commit) => ParseState::Accumulating(commit),
                None => {
                    tracing::debug!(line, "dropping malformed commit boundary");
                    ParseState::Discarding
                }
            };
            return;
        }

        let ParseState::Accumulating(commit) = &mut self.state else {
            return;
        };
        if let Some((added, deleted)) = parse_numstat(line) {
            commit.files_changed += 1;
            commit.additions = commit.additions.saturating_add(added);
            commit.deletions = commit.deletions.saturating_add(deleted);
        }
    }

    /// Flushes the last commit and returns every unique commit in log order.
    pub fn finish(mut self) -> Vec<CommitRecord> {
        self.finalize_current();
        self.commits
    }

    fn finalize_current(&mut self) {
        if let ParseState::Accumulating(commit) = std::mem::take(&mut self.state) {
            if self.seen.insert(commit.hash.clone()) {
                self.commits.push(commit);
            } else {
                tracing::debug!(hash = %commit.hash, "skipping commit seen on another branch");
            }
        }
    }
}

/// Parses a complete log stream.
pub fn parse_log(output: &str) -> Vec<CommitRecord> {
    let commits = output
        .lines()
        .fold(LogParser::new(), |mut parser, line| {
            parser.push_line(line);
            parser
        })
        .finish();
    tracing::debug!(count = commits.len(), "parsed commits");
    commits
}

fn parse_boundary(fields: &str) -> Option<CommitRecord> {
    let parts: Vec<&str> = fields.splitn(BOUNDARY_FIELDS, FIELD_DELIMITER).collect();
    let [hash, author_name, author_email, timestamp, message] = parts.as_slice() else {
        return None;
    };
    if hash.is_empty() {
        return None;
    }
    let timestamp = timestamp.trim().parse().ok()?;
    Some(CommitRecord::new(
        *hash,
        *author_name,
        *author_email,
        timestamp,
        *message,
    ))
}

/// Returns `(added, deleted)` for a `<added>\t<deleted>\t<path>` line.
fn parse_numstat(line: &str) -> Option<(u64, u64)> {
    let mut parts = line.splitn(3, '\t');
    let added = parts.next()?;
    let deleted = parts.next()?;
    parts.next()?;
    Some((line_count(added), line_count(deleted)))
}

fn line_count(field: &str) -> u64 {
    let field = field.trim();
    if field == BINARY_MARKER {
        return 0;
    }
    field.parse().unwrap_or(0)
}
