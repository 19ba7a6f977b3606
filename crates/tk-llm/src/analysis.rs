//! Prompt construction and structured response validation.

use serde::Deserialize;
use serde_json::{Value, json};
use tk_core::{CommitRecord, EstimationResult, TaskEstimate};

use crate::LlmError;

/// Builds one prompt describing every commit in the batch.
pub fn build_prompt(commits: &[CommitRecord]) -> String {
    let mut lines = Vec::new();
    lines.push("Analyze these git commits from one day and provide:".to_string());
    lines.push(
        "1. Total estimated development time in hours (planning, coding, testing, debugging)"
            .to_string(),
    );
    lines.push("2. A summary of what was accomplished".to_string());
    lines.push("3. A brief breakdown of major tasks with hours for each".to_string());
    lines.push(String::new());
    lines.push("Commits:".to_string());
    for commit in commits {
        lines.push(format!(
            "- [{}] {} (+{}/-{} in {} files)",
            commit.short_hash(),
            commit.message,
            commit.additions,
            commit.deletions,
            commit.files_changed
        ));
    }
    lines.push(String::new());
    lines.push("Consider:".to_string());
    lines.push("- Related commits might be part of the same task".to_string());
    lines.push("- Small commits (typos, formatting) take minimal time".to_string());
    lines.push("- Large changes or new features take more time".to_string());
    lines.push("- Include overhead time for context switching".to_string());
    lines.push("- Be realistic with time estimates".to_string());
    lines.join("\n")
}

/// JSON schema the service is asked to follow.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "total_hours": { "type": "NUMBER" },
            "summary": { "type": "STRING" },
            "major_tasks": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "task": { "type": "STRING" },
                        "hours": { "type": "NUMBER" }
                    },
                    "required": ["task", "hours"]
                }
            }
        },
        "required": ["total_hours", "summary", "major_tasks"]
    })
}

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    total_hours: f64,
    summary: String,
    major_tasks: Vec<TaskPayload>,
}

#[derive(Debug, Deserialize)]
struct TaskPayload {
    task: String,
    hours: f64,
}

/// Parses and validates the service's structured output.
///
/// The result is not normalized yet.
pub fn parse_analysis(text: &str) -> Result<EstimationResult, LlmError> {
    let value: Value = serde_json::from_str(text).map_err(LlmError::MalformedOutput)?;
    let payload: AnalysisPayload =
        serde_json::from_value(value).map_err(|err| LlmError::InvalidShape(err.to_string()))?;

    if !is_valid_hours(payload.total_hours) {
        return Err(LlmError::InvalidShape(format!(
            "total_hours must be a non-negative number, got {}",
            payload.total_hours
        )));
    }
    if let Some(task) = payload.major_tasks.iter().find(|t| !is_valid_hours(t.hours)) {
        return Err(LlmError::InvalidShape(format!(
            "hours for task '{}' must be a non-negative number, got {}",
            task.task, task.hours
        )));
    }

    Ok(EstimationResult {
        total_hours: payload.total_hours,
        summary: payload.summary.trim().to_string(),
        major_tasks: payload
            .major_tasks
            .into_iter()
            .map(|task| TaskEstimate {
                task: task.task.trim().to_string(),
                hours: task.hours,
            })
            .collect(),
        error: None,
    })
}

fn is_valid_hours(hours: f64) -> bool {
    hours.is_finite() && hours >= 0.0
}
