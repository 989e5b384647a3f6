//! Implementation of `parcel tasks`.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use parcel_lib::execute::ExecuteConfig;
use parcel_lib::task::TaskKind;

use crate::output::{OutputFormat, print_json, symbols};

#[derive(Serialize)]
struct TaskInfo {
  name: String,
  kind: TaskKind,
  project: Option<String>,
  prerequisites: Vec<String>,
  actions: Vec<String>,
}

pub fn cmd_tasks(manifest: &Path, config: ExecuteConfig, verbose: bool, format: OutputFormat) -> Result<()> {
  let session = super::load(manifest, config)?;
  let graph = session.graph();

  let tasks: Vec<TaskInfo> = graph
    .task_names()
    .into_iter()
    .filter_map(|name| graph.get(&name))
    .map(|task| TaskInfo {
      name: task.name.clone(),
      kind: task.kind,
      project: task.project.clone(),
      prerequisites: graph.prerequisites(&task.name),
      actions: task.actions.iter().map(|a| a.describe()).collect(),
    })
    .collect();

  if format.is_json() {
    return print_json(&tasks);
  }

  for task in &tasks {
    println!("{}", task.name);
    for prereq in &task.prerequisites {
      println!("  {} {}", symbols::ARROW, prereq);
    }
    if verbose {
      for action in &task.actions {
        println!("  {} {}", symbols::INFO, action);
      }
    }
  }
  Ok(())
}
