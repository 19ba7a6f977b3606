//! Day command: estimate every configured project for one day.

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use tk_core::{DayReport, ProjectReport, TaskEstimate};
use tk_llm::{Client, Orchestrator};

use crate::Config;
use crate::analyzer::ProjectAnalyzer;

const RULE: &str = "==================================================";
const MAX_TASKS: usize = 5;

pub fn run<W: Write>(writer: &mut W, config: &Config, day: NaiveDate, json: bool) -> Result<()> {
    let api_key = require_api_key(config.resolve_api_key())?;
    let projects = config.load_projects()?;

    let client = Client::new(api_key, config.model.as_str()).context("failed to create LLM client")?;
    tracing::info!(%day, projects = projects.len(), model = client.model(), "analyzing day");
    let analyzer = ProjectAnalyzer::new(Orchestrator::new(client));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")?;
    let report = runtime.block_on(analyzer.run_day(&projects, day));
    let failed = report.failed_count();
    if failed > 0 {
        tracing::warn!(failed, "some projects could not be analyzed");
    }

    write_report(writer, &report, json)
}

fn require_api_key(api_key: Option<String>) -> Result<String> {
    api_key.ok_or_else(|| {
        anyhow!("missing Gemini API key (set TIMEKEEP_API_KEY, GEMINI_API_KEY or api_key in config.toml)")
    })
}

pub fn write_report<W: Write>(writer: &mut W, report: &DayReport, json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(report).context("failed to serialize JSON")?;
        writeln!(writer, "{json}")?;
        return Ok(());
    }

    writeln!(writer, "Timekeep report for {}", report.date.format("%Y-%m-%d"))?;
    writeln!(writer, "{RULE}")?;
    if report.projects.is_empty() {
        writeln!(writer, "No projects configured.")?;
    }
    for project in &report.projects {
        writeln!(writer)?;
        write_project(writer, project)?;
    }
    writeln!(writer)?;
    writeln!(writer, "{RULE}")?;
    writeln!(
        writer,
        "Total time across all projects: {:.2} hours",
        report.total_hours
    )?;
    Ok(())
}

fn write_project<W: Write>(writer: &mut W, project: &ProjectReport) -> Result<()> {
    let estimate = &project.estimate;

    if let Some(error) = project.error() {
        writeln!(writer, "{}: error: {error}", project.name)?;
        if project.commits > 0 {
            writeln!(writer, "  Commits: {}", project.commits)?;
            writeln!(
                writer,
                "  Fallback time: {:.2} hours (excluded from total)",
                estimate.total_hours
            )?;
        }
        return Ok(());
    }

    writeln!(writer, "{}:", project.name)?;
    writeln!(writer, "  Commits: {}", project.commits)?;
    writeln!(writer, "  Time: {:.2} hours", estimate.total_hours)?;
    if !estimate.summary.is_empty() {
        writeln!(writer, "  Summary: {}", estimate.summary)?;
    }

    let tasks = top_tasks(&estimate.major_tasks);
    if !tasks.is_empty() {
        writeln!(writer, "  Major tasks:")?;
        for task in tasks {
            writeln!(writer, "    - {} ({:.2}h)", task.task, task.hours)?;
        }
    }
    Ok(())
}

/// Largest tasks first, at most [`MAX_TASKS`].
fn top_tasks(tasks: &[TaskEstimate]) -> Vec<&TaskEstimate> {
    let mut sorted: Vec<&TaskEstimate> = tasks.iter().collect();
    sorted.sort_by(|a, b| b.hours.total_cmp(&a.hours));
    sorted.truncate(MAX_TASKS);
    sorted
}
