//! Estimation results and the numeric policy applied to them.
//!
//! Every hour figure passes through the same pipeline regardless of where it
//! came from:
//!
//! 1. the fallback estimate is clamped to [`FallbackPolicy::max_hours`]
//!    (fallback path only),
//! 2. divided by [`EstimationPolicy::scale_divisor`],
//! 3. rounded to the nearest [`EstimationPolicy::granularity`],
//! 4. totals are capped at [`EstimationPolicy::max_daily_hours`].
//!
//! Task hours are normalized independently and are not re-summed into the
//! total.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::commit::{CommitRecord, total_changed_lines};

/// One line of the task breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEstimate {
    pub task: String,
    pub hours: f64,
}

/// Estimated effort for one project on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub total_hours: f64,
    pub summary: String,
    pub major_tasks: Vec<TaskEstimate>,
    /// Set when the figure is a fallback or the project could not be analyzed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EstimationResult {
    /// A zero-hour result with no tasks and no error.
    pub fn zero(summary: impl Into<String>) -> Self {
        Self {
            total_hours: 0.0,
            summary: summary.into(),
            major_tasks: Vec::new(),
            error: None,
        }
    }

    /// A zero-hour result carrying an error.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            total_hours: 0.0,
            summary: String::new(),
            major_tasks: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Why the model estimate was replaced by the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCategory {
    /// The response text was not valid JSON.
    MalformedOutput,
    /// The JSON did not match the expected analysis shape.
    InvalidShape,
    /// Transport failure or an error returned by the service.
    #[serde(rename = "upstream-error")]
    Upstream,
    /// The call did not finish within its time bound.
    Timeout,
    Other,
}

impl FailureCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedOutput => "malformed-output",
            Self::InvalidShape => "invalid-shape",
            Self::Upstream => "upstream-error",
            Self::Timeout => "timeout",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of estimating a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Estimation {
    /// Normalized figures from the estimation service.
    Model(EstimationResult),
    /// Normalized fallback figures after a failure.
    Fallback {
        result: EstimationResult,
        category: FailureCategory,
        detail: String,
    },
}

impl Estimation {
    pub const fn result(&self) -> &EstimationResult {
        match self {
            Self::Model(result) | Self::Fallback { result, .. } => result,
        }
    }

    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Flattens into a result whose `error` is set for fallbacks.
    pub fn into_result(self) -> EstimationResult {
        match self {
            Self::Model(result) => result,
            Self::Fallback {
                mut result,
                category,
                detail,
            } => {
                result.error = Some(format!("{category}: {detail}"));
                result
            }
        }
    }
}

/// Deterministic estimate from line counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackPolicy {
    /// Floor for any day with at least one commit.
    pub base_hours: f64,
    pub lines_per_hour: f64,
    /// A full working day.
    pub max_hours: f64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            base_hours: 0.5,
            lines_per_hour: 100.0,
            max_hours: 8.0,
        }
    }
}

impl FallbackPolicy {
    /// Raw hours before normalization. Zero when there are no commits.
    #[allow(clippy::cast_precision_loss)]
    pub fn estimate(&self, total_changed_lines: u64, commit_count: usize) -> f64 {
        if commit_count == 0 {
            return 0.0;
        }
        let hours = self.base_hours + total_changed_lines as f64 / self.lines_per_hour;
        hours.min(self.max_hours)
    }
}

/// Scaling, rounding and capping applied to every estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimationPolicy {
    /// Correction between the service's naive figures and observed time.
    pub scale_divisor: f64,
    /// Hours are rounded to a multiple of this.
    pub granularity: f64,
    /// Cap on a project's daily total. Must be a multiple of `granularity`.
    pub max_daily_hours: f64,
    pub fallback: FallbackPolicy,
}

impl Default for EstimationPolicy {
    fn default() -> Self {
        Self {
            scale_divisor: 4.0,
            granularity: 0.25,
            max_daily_hours: 8.0,
            fallback: FallbackPolicy::default(),
        }
    }
}

impl EstimationPolicy {
    /// Scales and rounds one figure. Negative or non-finite input becomes zero.
    pub fn normalize_hours(&self, hours: f64) -> f64 {
        if !hours.is_finite() || hours <= 0.0 {
            return 0.0;
        }
        let scaled = hours / self.scale_divisor;
        (scaled / self.granularity).round() * self.granularity
    }

    /// Normalizes a total and applies the daily cap.
    pub fn normalize_total(&self, hours: f64) -> f64 {
        self.normalize_hours(hours).min(self.max_daily_hours)
    }

    /// Normalizes every figure in a service result.
    pub fn normalize(&self, result: EstimationResult) -> EstimationResult {
        EstimationResult {
            total_hours: self.normalize_total(result.total_hours),
            major_tasks: result
                .major_tasks
                .into_iter()
                .map(|task| TaskEstimate {
                    hours: self.normalize_hours(task.hours),
                    task: task.task,
                })
                .collect(),
            ..result
        }
    }

    /// Normalized fallback hours for a batch.
    pub fn fallback_hours(&self, commits: &[CommitRecord]) -> f64 {
        let raw = self
            .fallback
            .estimate(total_changed_lines(commits), commits.len());
        self.normalize_total(raw)
    }

    /// Builds the fallback outcome for a failed batch.
    pub fn fallback(
        &self,
        commits: &[CommitRecord],
        category: FailureCategory,
        detail: impl Into<String>,
    ) -> Estimation {
        let summary = format!(
            "Estimation failed ({category}). Fallback: {} commits, {} lines changed.",
            commits.len(),
            total_changed_lines(commits)
        );
        Estimation::Fallback {
            result: EstimationResult {
                total_hours: self.fallback_hours(commits),
                summary,
                major_tasks: Vec::new(),
                error: None,
            },
            category,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit_with_lines(hash: &str, additions: u64, deletions: u64) -> CommitRecord {
        let mut commit = CommitRecord::new(hash, "me", "me@example.com", 0, "work");
        commit.additions = additions;
        commit.deletions = deletions;
        commit
    }

    fn is_multiple_of(value: f64, step: f64) -> bool {
        let ratio = value / step;
        (ratio - ratio.round()).abs() < f64::EPSILON
    }

    #[test]
    fn fallback_is_zero_without_commits() {
        let policy = FallbackPolicy::default();
        assert!(policy.estimate(0, 0).abs() < f64::EPSILON);
        assert!(policy.estimate(500, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_adds_base_and_line_rate() {
        let policy = FallbackPolicy::default();
        assert!((policy.estimate(0, 1) - 0.5).abs() < f64::EPSILON);
        assert!((policy.estimate(250, 3) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_is_deterministic_monotonic_and_capped() {
        let policy = FallbackPolicy::default();
        let mut previous = 0.0;
        for lines in (0..5_000).step_by(37) {
            let first = policy.estimate(lines, 2);
            let second = policy.estimate(lines, 2);
            assert!((first - second).abs() < f64::EPSILON);
            assert!(first >= previous);
            assert!(first <= policy.max_hours);
            previous = first;
        }
        assert!((policy.estimate(u64::MAX, 1) - policy.max_hours).abs() < f64::EPSILON);
    }

    #[test]
    fn normalize_scales_rounds_and_caps_total() {
        let policy = EstimationPolicy::default();
        let result = EstimationResult {
            total_hours: 5.1,
            summary: "Did things".to_string(),
            major_tasks: vec![
                TaskEstimate {
                    task: "Feature".to_string(),
                    hours: 3.0,
                },
                TaskEstimate {
                    task: "Bugfix".to_string(),
                    hours: 0.4,
                },
            ],
            error: None,
        };

        let normalized = policy.normalize(result);
        // 5.1 / 4 = 1.275 -> 1.25
        assert!((normalized.total_hours - 1.25).abs() < f64::EPSILON);
        // 3.0 / 4 = 0.75
        assert!((normalized.major_tasks[0].hours - 0.75).abs() < f64::EPSILON);
        // 0.4 / 4 = 0.1 -> 0.0
        assert!(normalized.major_tasks[1].hours.abs() < f64::EPSILON);
        assert_eq!(normalized.summary, "Did things");
        assert_eq!(normalized.major_tasks[0].task, "Feature");
    }

    #[test]
    fn normalize_caps_total_but_not_tasks() {
        let policy = EstimationPolicy::default();
        let normalized = policy.normalize(EstimationResult {
            total_hours: 100.0,
            summary: String::new(),
            major_tasks: vec![TaskEstimate {
                task: "Marathon".to_string(),
                hours: 60.0,
            }],
            error: None,
        });
        assert!((normalized.total_hours - policy.max_daily_hours).abs() < f64::EPSILON);
        assert!((normalized.major_tasks[0].hours - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn normalized_totals_stay_in_bounds_on_the_grid() {
        let policy = EstimationPolicy::default();
        for step in 0..400 {
            let raw = f64::from(step) * 0.173;
            let total = policy.normalize_total(raw);
            assert!(total >= 0.0);
            assert!(total <= policy.max_daily_hours);
            assert!(is_multiple_of(total, policy.granularity), "{total}");
        }
    }

    #[test]
    fn negative_and_non_finite_hours_become_zero() {
        let policy = EstimationPolicy::default();
        assert!(policy.normalize_hours(-3.0).abs() < f64::EPSILON);
        assert!(policy.normalize_hours(f64::NAN).abs() < f64::EPSILON);
        assert!(policy.normalize_hours(f64::INFINITY).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_hours_follow_the_same_normalization() {
        let policy = EstimationPolicy::default();
        let commits = vec![commit_with_lines("a", 150, 50), commit_with_lines("b", 40, 10)];
        // 0.5 + 250 / 100 = 3.0 -> / 4 = 0.75
        assert!((policy.fallback_hours(&commits) - 0.75).abs() < f64::EPSILON);

        let huge = vec![commit_with_lines("c", 100_000, 0)];
        // clamped to 8.0 -> 2.0
        assert!((policy.fallback_hours(&huge) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_outcome_carries_category_in_error() {
        let policy = EstimationPolicy::default();
        let commits = vec![commit_with_lines("a", 10, 0)];
        let estimation = policy.fallback(&commits, FailureCategory::Timeout, "took too long");
        assert!(estimation.is_fallback());

        let result = estimation.into_result();
        assert_eq!(result.error.as_deref(), Some("timeout: took too long"));
        assert!(result.summary.contains("1 commits, 10 lines changed"));
        assert!(result.major_tasks.is_empty());
    }

    #[test]
    fn model_outcome_has_no_error() {
        let result = Estimation::Model(EstimationResult::zero("ok")).into_result();
        assert!(result.error.is_none());
    }

    #[test]
    fn category_labels_are_kebab_case() {
        assert_eq!(FailureCategory::MalformedOutput.to_string(), "malformed-output");
        assert_eq!(FailureCategory::InvalidShape.to_string(), "invalid-shape");
        assert_eq!(FailureCategory::Upstream.to_string(), "upstream-error");
        assert_eq!(
            serde_json::to_string(&FailureCategory::MalformedOutput).unwrap(),
            "\"malformed-output\""
        );
    }
}
