//! Task graph with prerequisite edges and wave computation.
//!
//! Edges point from a prerequisite to the task that needs it. Tasks are
//! addressed by name and defined at most once; defining an existing name
//! returns the existing node, which keeps declarations re-entrant.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;
use tracing::debug;

use super::types::{Action, Task};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
  #[error("adding '{prerequisite}' as a prerequisite of '{task}' would create a cycle")]
  CycleDetected { task: String, prerequisite: String },

  #[error("task not found: {0}")]
  TaskNotFound(String),
}

#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
  graph: DiGraph<Task, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl TaskGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add `task` unless a task with the same name exists. Returns whether the
  /// task was added.
  pub fn define(&mut self, task: Task) -> bool {
    if self.nodes.contains_key(&task.name) {
      return false;
    }
    let name = task.name.clone();
    let idx = self.graph.add_node(task);
    self.nodes.insert(name, idx);
    true
  }

  pub fn contains(&self, name: &str) -> bool {
    self.nodes.contains_key(name)
  }

  pub fn get(&self, name: &str) -> Option<&Task> {
    self.nodes.get(name).map(|&idx| &self.graph[idx])
  }

  pub fn get_mut(&mut self, name: &str) -> Option<&mut Task> {
    self.nodes.get(name).map(|&idx| &mut self.graph[idx])
  }

  fn index(&self, name: &str) -> Result<NodeIndex, GraphError> {
    self
      .nodes
      .get(name)
      .copied()
      .ok_or_else(|| GraphError::TaskNotFound(name.to_string()))
  }

  /// Make `prerequisite` run before `task`. Adding an existing edge is a no-op.
  pub fn depend(&mut self, task: &str, prerequisite: &str) -> Result<(), GraphError> {
    let task_idx = self.index(task)?;
    let prereq_idx = self.index(prerequisite)?;

    if task_idx == prereq_idx || has_path_connecting(&self.graph, task_idx, prereq_idx, None) {
      return Err(GraphError::CycleDetected {
        task: task.to_string(),
        prerequisite: prerequisite.to_string(),
      });
    }

    self.graph.update_edge(prereq_idx, task_idx, ());
    Ok(())
  }

  pub fn append_action(&mut self, task: &str, action: Action) -> Result<(), GraphError> {
    let idx = self.index(task)?;
    self.graph[idx].actions.push(action);
    Ok(())
  }

  /// Append `action` unless the task already carries an equal one.
  pub fn append_action_once(&mut self, task: &str, action: Action) -> Result<bool, GraphError> {
    let idx = self.index(task)?;
    let actions = &mut self.graph[idx].actions;
    if actions.contains(&action) {
      return Ok(false);
    }
    actions.push(action);
    Ok(true)
  }

  /// Direct prerequisites of `task`, sorted by name.
  pub fn prerequisites(&self, task: &str) -> Vec<String> {
    self.neighbors(task, Direction::Incoming)
  }

  /// Tasks that directly need `task`, sorted by name.
  pub fn dependents(&self, task: &str) -> Vec<String> {
    self.neighbors(task, Direction::Outgoing)
  }

  fn neighbors(&self, task: &str, direction: Direction) -> Vec<String> {
    let Some(&idx) = self.nodes.get(task) else {
      return Vec::new();
    };
    let mut names: Vec<String> = self
      .graph
      .neighbors_directed(idx, direction)
      .map(|n| self.graph[n].name.clone())
      .collect();
    names.sort();
    names
  }

  /// All task names, sorted.
  pub fn task_names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.nodes.keys().cloned().collect();
    names.sort();
    names
  }

  pub fn tasks(&self) -> impl Iterator<Item = &Task> {
    self.graph.node_weights()
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// Waves of tasks needed to run `targets`.
  ///
  /// Takes the transitive prerequisites of the targets, stopping at tasks in
  /// `satisfied`, and levels them so every task's prerequisites sit in
  /// earlier waves. Names inside a wave are sorted.
  pub fn execution_waves(&self, targets: &[String], satisfied: &HashSet<String>) -> Result<Vec<Vec<String>>, GraphError> {
    let mut needed: HashSet<NodeIndex> = HashSet::new();
    let mut stack = Vec::new();
    for target in targets {
      let idx = self.index(target)?;
      if !satisfied.contains(target) && needed.insert(idx) {
        stack.push(idx);
      }
    }

    while let Some(idx) = stack.pop() {
      for prereq in self.graph.neighbors_directed(idx, Direction::Incoming) {
        if satisfied.contains(&self.graph[prereq].name) {
          continue;
        }
        if needed.insert(prereq) {
          stack.push(prereq);
        }
      }
    }

    // Kahn levels over the needed subgraph
    let mut in_degree: HashMap<NodeIndex, usize> = needed
      .iter()
      .map(|&idx| {
        let degree = self
          .graph
          .neighbors_directed(idx, Direction::Incoming)
          .filter(|n| needed.contains(n))
          .count();
        (idx, degree)
      })
      .collect();

    let mut waves = Vec::new();
    let mut remaining = needed.clone();
    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = remaining.iter().filter(|idx| in_degree[*idx] == 0).copied().collect();
      if ready.is_empty() {
        let stuck = remaining.iter().map(|&idx| self.graph[idx].name.clone()).min().unwrap_or_default();
        return Err(GraphError::CycleDetected {
          task: stuck.clone(),
          prerequisite: stuck,
        });
      }

      for idx in &ready {
        remaining.remove(idx);
        for dependent in self.graph.neighbors_directed(*idx, Direction::Outgoing) {
          if let Some(degree) = in_degree.get_mut(&dependent) {
            *degree = degree.saturating_sub(1);
          }
        }
      }

      let wave: BTreeSet<String> = ready.iter().map(|&idx| self.graph[idx].name.clone()).collect();
      waves.push(wave.into_iter().collect());
    }

    debug!(targets = ?targets, waves = waves.len(), "computed execution waves");
    Ok(waves)
  }
}
