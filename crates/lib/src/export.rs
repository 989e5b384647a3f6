//! Project-file exporter.
//!
//! Writes one module file per project and one workspace file per top-level
//! project, for consumption by external tooling. Module references are paths
//! relative to the top-level project's base dir. Files are only rewritten when
//! a tracked build-definition file is newer than them.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::ArtifactSpec;
use crate::classify::{ClasspathEntry, classify, in_tree_packages, resolve_classpath};
use crate::project::{Project, ProjectId};
use crate::session::BuildSession;

pub const MODULE_SUFFIX: &str = "parcel-module.json";
pub const WORKSPACE_SUFFIX: &str = "parcel-workspace.json";

#[derive(Debug, Error)]
pub enum ExportError {
  #[error("failed to write {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to serialize {}: {source}", .path.display())]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
  /// Build-definition files whose changes make exported files stale.
  pub tracked: Vec<PathBuf>,
  /// Rewrite everything regardless of timestamps.
  pub force: bool,
}

#[derive(Debug, Default)]
pub struct ExportReport {
  pub written: Vec<PathBuf>,
  pub unchanged: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ModuleFile<'a> {
  name: &'a str,
  group: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  version: Option<String>,
  base_dir: String,
  /// Module files of in-tree dependencies, relative to the workspace root.
  modules: Vec<String>,
  repository: Vec<ExportedArtifact>,
  generated: Vec<String>,
  libraries: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ExportedArtifact {
  #[serde(skip_serializing_if = "Option::is_none")]
  spec: Option<ArtifactSpec>,
  path: String,
}

#[derive(Debug, Serialize)]
struct WorkspaceFile<'a> {
  name: &'a str,
  modules: Vec<String>,
}

/// Path of a project's module file.
pub fn module_file(project: &Project) -> PathBuf {
  project.base_dir().join(format!("{}.{MODULE_SUFFIX}", project.id()))
}

/// Path of a top-level project's workspace file.
pub fn workspace_file(project: &Project) -> PathBuf {
  project.base_dir().join(format!("{}.{WORKSPACE_SUFFIX}", project.id()))
}

pub fn export(session: &BuildSession, options: &ExportOptions) -> Result<ExportReport, ExportError> {
  let workspace = session.workspace();
  let in_tree = in_tree_packages(workspace);
  let mut report = ExportReport::default();

  for root_key in workspace.roots() {
    let root = workspace.get(root_key);
    let root_dir = root.base_dir();
    let mut modules = Vec::new();

    for key in descendants(session, root_key) {
      let project = workspace.get(key);
      let path = module_file(project);
      modules.push(relative_to(&path, root_dir));

      if !options.force && !is_stale(&path, &options.tracked) {
        debug!(path = %path.display(), "module file up to date");
        report.unchanged.push(path);
        continue;
      }

      let classpath = resolve_classpath(project, session.index(), session.repository());
      let parts = classify(&classpath, &in_tree, session.repository().root(), &project.target_dir());
      let module = ModuleFile {
        name: project.name(),
        group: workspace.group(key),
        version: workspace.version(key),
        base_dir: relative_to(project.base_dir(), root_dir),
        modules: parts
          .workspace_modules
          .iter()
          .filter_map(|name| workspace.lookup(name).ok())
          .map(|p| relative_to(&module_file(p), root_dir))
          .collect(),
        repository: parts
          .repo_artifacts
          .iter()
          .map(|entry| ExportedArtifact {
            spec: match entry {
              ClasspathEntry::Artifact { spec, .. } => Some(spec.clone()),
              ClasspathEntry::Path { .. } => None,
            },
            path: entry.path().to_string_lossy().into_owned(),
          })
          .collect(),
        generated: parts.generated.iter().map(|e| relative_to(e.path(), root_dir)).collect(),
        libraries: parts.local_files.iter().map(|e| relative_to(e.path(), root_dir)).collect(),
      };
      write_json(&path, &module)?;
      report.written.push(path);
    }

    let path = workspace_file(root);
    if !options.force && !is_stale(&path, &options.tracked) {
      report.unchanged.push(path);
      continue;
    }
    write_json(
      &path,
      &WorkspaceFile {
        name: root.name(),
        modules,
      },
    )?;
    report.written.push(path);
  }

  info!(written = report.written.len(), unchanged = report.unchanged.len(), "exported project files");
  Ok(report)
}

/// `root` and every project below it, depth first.
fn descendants(session: &BuildSession, root: ProjectId) -> Vec<ProjectId> {
  let mut out = Vec::new();
  let mut stack = vec![root];
  while let Some(key) = stack.pop() {
    out.push(key);
    stack.extend(session.workspace().get(key).children().iter().rev());
  }
  out
}

/// Missing, or older than any tracked file.
fn is_stale(path: &Path, tracked: &[PathBuf]) -> bool {
  let Some(written) = modified(path) else {
    return true;
  };
  tracked.iter().any(|t| modified(t).is_some_and(|m| m > written))
}

fn modified(path: &Path) -> Option<SystemTime> {
  fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn relative_to(path: &Path, base: &Path) -> String {
  let Some(relative) = pathdiff::diff_paths(path, base) else {
    return path.to_string_lossy().into_owned();
  };
  let text = relative
    .iter()
    .map(|c| c.to_string_lossy())
    .collect::<Vec<_>>()
    .join("/");
  if text.is_empty() { ".".to_string() } else { text }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
  let mut content = serde_json::to_string_pretty(value).map_err(|source| ExportError::Serialize {
    path: path.to_path_buf(),
    source,
  })?;
  content.push('\n');

  let write_err = |source| ExportError::Write {
    path: path.to_path_buf(),
    source,
  };
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(write_err)?;
  }
  let temp = path.with_extension("json.tmp");
  fs::write(&temp, content).map_err(write_err)?;
  fs::rename(&temp, path).map_err(write_err)?;
  debug!(path = %path.display(), "wrote project file");
  Ok(())
}
