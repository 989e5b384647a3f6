//! Implementation of the lifecycle commands (`parcel build`, `package`,
//! `install`, `uninstall`, `upload`).

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::debug;

use parcel_lib::execute::{ExecuteConfig, ExecuteError, RunReport};
use parcel_lib::task::Lifecycle;

use crate::output::{
  OutputFormat, format_duration, print_error, print_json, print_stat, print_success, print_warning, symbols,
};

#[derive(Serialize)]
struct RunSummary<'a> {
  task: &'a str,
  success: bool,
  completed: &'a [String],
  up_to_date: &'a [String],
  failed: Vec<FailedTask>,
  skipped: &'a BTreeMap<String, String>,
  duration_ms: u128,
}

#[derive(Serialize)]
struct FailedTask {
  task: String,
  project: Option<String>,
  error: String,
}

/// Run a lifecycle task.
///
/// Without `--project` the task is scoped to the project whose base dir holds
/// the current directory; from the top-level project or outside the
/// workspace, the process-wide task runs.
pub fn cmd_run(
  manifest: &Path,
  config: ExecuteConfig,
  lifecycle: Lifecycle,
  project: Option<String>,
  format: OutputFormat,
) -> Result<()> {
  let session = super::load(manifest, config)?;

  let scope = match project {
    Some(name) => {
      session.workspace().lookup(&name)?;
      Some(name)
    }
    None => {
      let cwd = std::env::current_dir().context("Failed to read current directory")?;
      let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);
      session.scope_for_dir(&cwd)
    }
  };
  let task = lifecycle.task_name(scope.as_deref());
  debug!(task = %task, "resolved target");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let start = Instant::now();
  let report = rt
    .block_on(session.run(lifecycle, scope.as_deref()))
    .with_context(|| format!("Failed to run {task}"))?;
  let elapsed = start.elapsed();

  if format.is_json() {
    print_json(&RunSummary {
      task: &task,
      success: report.is_success(),
      completed: &report.completed,
      up_to_date: &report.up_to_date,
      failed: report
        .failed
        .iter()
        .map(|(name, err)| FailedTask {
          task: name.clone(),
          project: failed_project(err),
          error: err.to_string(),
        })
        .collect(),
      skipped: &report.skipped,
      duration_ms: elapsed.as_millis(),
    })?;
  } else {
    print_report(&task, lifecycle, &report, elapsed);
  }

  if !report.is_success() {
    bail!("{task} failed");
  }
  Ok(())
}

fn failed_project(err: &ExecuteError) -> Option<String> {
  match err {
    ExecuteError::Task { project, .. } => project.clone(),
    _ => None,
  }
}

fn print_report(task: &str, lifecycle: Lifecycle, report: &RunReport, elapsed: Duration) {
  for (name, err) in &report.failed {
    print_error(&format!("{name}: {err}"));
    if let Some(project) = failed_project(err) {
      eprintln!("  {} parcel {lifecycle} --project {project}", symbols::ARROW);
    }
  }
  for (name, cause) in &report.skipped {
    print_warning(&format!("{name} skipped ({cause} did not complete)"));
  }

  if report.is_success() {
    print_success(&format!("{task} finished in {}", format_duration(elapsed)));
  }
  print_stat("Completed", &report.completed.len().to_string());
  print_stat("Up to date", &report.up_to_date.len().to_string());
  if !report.is_success() {
    print_stat("Failed", &report.failed.len().to_string());
    print_stat("Skipped", &report.skipped.len().to_string());
  }
}
