//! Dependency classification for project-file generation.
//!
//! A resolved classpath is split, in order, into same-workspace modules,
//! repository artifacts, generated files and local library files. Each step
//! only sees what the previous one left over, and every partition keeps the
//! classpath order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::artifact::{ArtifactIndex, ArtifactSpec, LocalRepository};
use crate::project::{Dependency, Project, Workspace};

/// One resolved classpath element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClasspathEntry {
  Path { path: PathBuf },
  Artifact { spec: ArtifactSpec, path: PathBuf },
}

impl ClasspathEntry {
  pub fn path(&self) -> &Path {
    match self {
      ClasspathEntry::Path { path } | ClasspathEntry::Artifact { path, .. } => path,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
  /// Names of in-tree projects whose packages appear on the classpath.
  pub workspace_modules: Vec<String>,
  pub repo_artifacts: Vec<ClasspathEntry>,
  pub generated: Vec<ClasspathEntry>,
  pub local_files: Vec<ClasspathEntry>,
}

/// Map of package output file to owning project name, for every package
/// declared in the workspace.
pub fn in_tree_packages(workspace: &Workspace) -> HashMap<PathBuf, String> {
  workspace
    .iter()
    .flat_map(|project| project.packages().iter())
    .map(|package| (package.path.clone(), package.project.clone()))
    .collect()
}

pub fn classify(
  entries: &[ClasspathEntry],
  in_tree: &HashMap<PathBuf, String>,
  repo_root: &Path,
  output_dir: &Path,
) -> Classification {
  let mut result = Classification::default();

  let (modules, rest): (Vec<_>, Vec<_>) = entries
    .iter()
    .map(|entry| match in_tree.get(entry.path()) {
      Some(project) => Ok(project.clone()),
      None => Err(entry.clone()),
    })
    .partition(Result::is_ok);
  result.workspace_modules = modules.into_iter().filter_map(Result::ok).collect();

  let rest: Vec<ClasspathEntry> = rest.into_iter().filter_map(Result::err).collect();
  let (repo, rest): (Vec<_>, Vec<_>) = rest.into_iter().partition(|e| e.path().starts_with(repo_root));
  let (generated, local): (Vec<_>, Vec<_>) = rest.into_iter().partition(|e| e.path().starts_with(output_dir));

  result.repo_artifacts = repo;
  result.generated = generated;
  result.local_files = local;
  result
}

/// Resolve a project's dependencies to classpath entries.
///
/// Coordinates resolve to the in-tree package when the index has the spec,
/// otherwise to the local repository location. Paths are taken relative to
/// the project base dir.
pub fn resolve_classpath(project: &Project, index: &ArtifactIndex, repo: &LocalRepository) -> Vec<ClasspathEntry> {
  project
    .dependencies()
    .iter()
    .map(|dep| match dep {
      Dependency::Artifact(spec) => ClasspathEntry::Artifact {
        spec: spec.clone(),
        path: index
          .lookup(spec)
          .map(|a| a.path.clone())
          .unwrap_or_else(|| repo.locate(spec)),
      },
      Dependency::File(path) => ClasspathEntry::Path {
        path: project.path_to(path),
      },
    })
    .collect()
}
