//! Task execution.
//!
//! This module runs requested tasks over the task graph. It handles:
//! - Wave ordering of the transitive prerequisites
//! - Parallel execution of independent tasks within a wave
//! - Skipping tasks whose prerequisites failed
//! - A session-wide ledger so completed tasks are not re-run
//! - The integration hook on the process-wide `package` task

pub mod actions;
pub mod types;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::task::{Action, GraphError, INTEGRATION_TASK, Task, TaskGraph};

use actions::{InstallLocks, execute_action};

pub use types::{ActionOutcome, ExecuteConfig, ExecuteError, ReleaseTarget, RunReport};

/// Tasks completed during a session, plus those running right now.
#[derive(Debug, Default)]
pub struct RunLedger {
  completed: HashSet<String>,
  active: HashSet<String>,
}

impl RunLedger {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_completed(&self, task: &str) -> bool {
    self.completed.contains(task)
  }

  pub fn completed(&self) -> impl Iterator<Item = &String> {
    self.completed.iter()
  }

  /// Tasks a new run treats as already done.
  fn satisfied(&self) -> HashSet<String> {
    self.completed.union(&self.active).cloned().collect()
  }

  /// Forget completed tasks so the next run starts fresh.
  pub fn clear(&mut self) {
    self.completed.clear();
  }
}

enum TaskOutcome {
  Ran { up_to_date: bool },
  AlreadyDone,
}

pub type RunFuture = Pin<Box<dyn Future<Output = Result<RunReport, ExecuteError>> + Send>>;

/// Runs tasks from a snapshot of the task graph.
pub struct Executor {
  graph: TaskGraph,
  ledger: Arc<Mutex<RunLedger>>,
  config: ExecuteConfig,
  locks: InstallLocks,
}

impl Executor {
  pub fn new(graph: TaskGraph, ledger: Arc<Mutex<RunLedger>>, config: ExecuteConfig) -> Arc<Self> {
    Arc::new(Self {
      graph,
      ledger,
      config,
      locks: InstallLocks::new(),
    })
  }

  pub fn config(&self) -> &ExecuteConfig {
    &self.config
  }

  fn ledger(&self) -> MutexGuard<'_, RunLedger> {
    self.ledger.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Run `targets` and everything they need that has not completed yet.
  ///
  /// Boxed because the integration hook re-enters it from inside a task.
  pub fn run(self: &Arc<Self>, targets: Vec<String>) -> RunFuture {
    let this = Arc::clone(self);
    Box::pin(async move { this.run_waves(targets).await })
  }

  async fn run_waves(self: Arc<Self>, targets: Vec<String>) -> Result<RunReport, ExecuteError> {
    let satisfied = self.ledger().satisfied();
    let waves = self.graph.execution_waves(&targets, &satisfied)?;
    info!(targets = ?targets, wave_count = waves.len(), "starting task execution");

    let mut report = RunReport::default();
    let mut blocked: HashSet<String> = HashSet::new();
    let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

    for (wave_idx, wave) in waves.into_iter().enumerate() {
      debug!(wave = wave_idx, tasks = wave.len(), "executing wave");

      let mut join_set = JoinSet::new();
      let mut names = HashMap::new();

      for name in wave {
        let failed_prereq = self
          .graph
          .prerequisites(&name)
          .into_iter()
          .find(|p| blocked.contains(p));
        if let Some(prereq) = failed_prereq {
          warn!(task = %name, failed_dep = %prereq, "skipping task due to failed prerequisite");
          blocked.insert(name.clone());
          report.skipped.insert(name, prereq);
          continue;
        }

        let exec = Arc::clone(&self);
        let semaphore = semaphore.clone();
        let task_name = name.clone();
        let handle = join_set.spawn(async move {
          let _permit = semaphore.acquire_owned().await.ok();
          exec.run_task(&task_name).await
        });
        names.insert(handle.id(), name);
      }

      while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
          Ok((id, result)) => {
            let name = names.remove(&id).unwrap_or_default();
            match result {
              Ok(TaskOutcome::Ran { up_to_date }) => {
                if up_to_date {
                  report.up_to_date.push(name.clone());
                }
                report.completed.push(name);
              }
              Ok(TaskOutcome::AlreadyDone) => report.completed.push(name),
              Err(e) => {
                error!(task = %name, error = %e, "task failed");
                blocked.insert(name.clone());
                report.failed.push((name, e));
              }
            }
          }
          Err(e) => {
            let name = names.remove(&e.id()).unwrap_or_default();
            error!(task = %name, error = %e, "task panicked");
            blocked.insert(name.clone());
            report.failed.push((name, ExecuteError::Io(std::io::Error::other(e.to_string()))));
          }
        }
      }
    }

    info!(
      completed = report.completed.len(),
      up_to_date = report.up_to_date.len(),
      failed = report.failed.len(),
      skipped = report.skipped.len(),
      "task execution complete"
    );
    Ok(report)
  }

  async fn run_task(self: Arc<Self>, name: &str) -> Result<TaskOutcome, ExecuteError> {
    {
      let mut ledger = self.ledger();
      if ledger.completed.contains(name) {
        return Ok(TaskOutcome::AlreadyDone);
      }
      ledger.active.insert(name.to_string());
    }

    let result = match self.graph.get(name) {
      Some(task) => self.run_actions(task).await,
      None => Err(GraphError::TaskNotFound(name.to_string()).into()),
    };

    let mut ledger = self.ledger();
    ledger.active.remove(name);
    match result {
      Ok(up_to_date) => {
        ledger.completed.insert(name.to_string());
        Ok(TaskOutcome::Ran { up_to_date })
      }
      Err(e) => Err(ExecuteError::Task {
        task: name.to_string(),
        project: self.graph.get(name).and_then(|t| t.project.clone()),
        source: Box::new(e),
      }),
    }
  }

  /// Run the task's actions in order. Returns whether every action was
  /// already up to date.
  async fn run_actions(self: &Arc<Self>, task: &Task) -> Result<bool, ExecuteError> {
    if task.actions.is_empty() {
      debug!(task = %task.name, "no actions");
      return Ok(false);
    }

    debug!(task = %task.name, actions = task.actions.len(), "running task");
    let mut up_to_date = true;
    for action in &task.actions {
      debug!(task = %task.name, action = %action.describe(), "action");
      let outcome = match action {
        Action::Integration => self.run_integration().await?,
        other => execute_action(other, &self.config, &self.locks).await?,
      };
      up_to_date &= outcome == ActionOutcome::UpToDate;
    }
    Ok(up_to_date)
  }

  /// Run the `integration` task inside the current run. Tasks executing right
  /// now count as satisfied, so packaging is not triggered again.
  async fn run_integration(self: &Arc<Self>) -> Result<ActionOutcome, ExecuteError> {
    if !self.config.integration {
      debug!("integration disabled");
      return Ok(ActionOutcome::UpToDate);
    }

    info!("running integration");
    let report = self.run(vec![INTEGRATION_TASK.to_string()]).await?;
    if !report.is_success() {
      let mut failed = report.failed_names();
      failed.extend(report.skipped.keys().cloned());
      return Err(ExecuteError::IntegrationFailed { failed });
    }
    Ok(ActionOutcome::Performed)
  }
}
