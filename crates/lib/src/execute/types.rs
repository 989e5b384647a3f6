//! Types for task execution.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::platform::paths::{integration_enabled, release_credentials, release_repo};
use crate::task::GraphError;

/// Errors raised while running tasks.
#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Archive writer failed.
  #[error("failed to write archive {}: {message}", .path.display())]
  Archive { path: PathBuf, message: String },

  /// Command exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  #[error("upload of {} failed: {message}", .file.display())]
  UploadFailed { file: PathBuf, message: String },

  #[error("no release repository configured (set PARCEL_RELEASE_REPO)")]
  NoReleaseTarget,

  /// A file an action needs does not exist.
  #[error("missing file: {}", .0.display())]
  MissingFile(PathBuf),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error("integration failed: {}", .failed.join(", "))]
  IntegrationFailed { failed: Vec<String> },

  /// A task failed; carries enough context to re-run the affected lifecycle task.
  #[error("task '{task}' (project {}) failed: {source}", .project.as_deref().unwrap_or("-"))]
  Task {
    task: String,
    project: Option<String>,
    #[source]
    source: Box<ExecuteError>,
  },
}

/// What an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
  Performed,
  /// Nothing to do; the output already matched.
  UpToDate,
}

/// Outcome of one `run` call.
#[derive(Debug, Default)]
pub struct RunReport {
  /// Tasks that ran successfully, in completion order.
  pub completed: Vec<String>,
  /// Completed tasks whose actions all reported up to date.
  pub up_to_date: Vec<String>,
  /// Tasks whose actions failed.
  pub failed: Vec<(String, ExecuteError)>,
  /// Tasks not run, mapped to the failed or skipped prerequisite.
  pub skipped: BTreeMap<String, String>,
}

impl RunReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty() && self.skipped.is_empty()
  }

  pub fn total(&self) -> usize {
    self.completed.len() + self.failed.len() + self.skipped.len()
  }

  pub fn failed_names(&self) -> Vec<String> {
    self.failed.iter().map(|(name, _)| name.clone()).collect()
  }
}

/// Where `upload` sends files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseTarget {
  /// A repository-layout directory.
  Directory(PathBuf),
  /// An HTTP repository accepting `PUT`.
  Http {
    url: String,
    username: Option<String>,
    password: Option<String>,
  },
}

impl ReleaseTarget {
  /// `http(s)://` URLs become [`ReleaseTarget::Http`]; `file://` URLs and plain
  /// paths become [`ReleaseTarget::Directory`].
  pub fn parse(value: &str, credentials: Option<(String, Option<String>)>) -> Self {
    if value.starts_with("http://") || value.starts_with("https://") {
      let (username, password) = match credentials {
        Some((user, pass)) => (Some(user), pass),
        None => (None, None),
      };
      return ReleaseTarget::Http {
        url: value.trim_end_matches('/').to_string(),
        username,
        password,
      };
    }
    let path = value.strip_prefix("file://").unwrap_or(value);
    ReleaseTarget::Directory(PathBuf::from(path))
  }

  pub fn from_env() -> Option<Self> {
    release_repo().map(|repo| Self::parse(&repo, release_credentials()))
  }
}

#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Maximum number of tasks running at once within a wave.
  pub parallelism: usize,

  /// Fire the integration hook after the process-wide `package` task.
  pub integration: bool,

  pub release: Option<ReleaseTarget>,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      integration: false,
      release: None,
    }
  }
}

impl ExecuteConfig {
  /// Defaults with the integration flag and release target read from the
  /// environment.
  pub fn from_env() -> Self {
    Self {
      integration: integration_enabled(),
      release: ReleaseTarget::from_env(),
      ..Self::default()
    }
  }
}

fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
