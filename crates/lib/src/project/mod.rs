//! Project hierarchy.
//!
//! Projects form a tree addressed by `:`-separated names (`app`, `app:util`).
//! Group and version are inherited from the nearest ancestor that sets them;
//! the group finally falls back to the root project's name. A project's id is
//! derived from its name and never stored.

pub mod manifest;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::artifact::ArtifactSpec;
use crate::consts::{DOCS_DIR, OUTPUT_DIR, PROJECT_SEPARATOR, SOURCES_DIR, TARGET_DIR};
use crate::package::Package;

pub use manifest::{ManifestError, load_session};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectError {
  #[error("project '{0}' is already defined")]
  DuplicateProject(String),

  #[error("parent project '{parent}' of '{name}' is not defined")]
  ParentNotFound { name: String, parent: String },

  #[error("root project '{0}' needs a base directory")]
  MissingBaseDir(String),

  #[error("no such project: {0}")]
  ProjectNotFound(String),
}

/// Handle to a project inside a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(pub usize);

/// A dependency as declared on a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
  Artifact(ArtifactSpec),
  File(PathBuf),
}

impl Dependency {
  /// Coordinates become [`Dependency::Artifact`]; anything path-like, or
  /// anything that does not parse as coordinates, is a file.
  pub fn parse(value: &str) -> Self {
    if value.contains('/') || value.contains('\\') {
      return Dependency::File(PathBuf::from(value));
    }
    match ArtifactSpec::parse(value) {
      Ok(spec) => Dependency::Artifact(spec),
      Err(_) => Dependency::File(PathBuf::from(value)),
    }
  }
}

/// Settings supplied when defining a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
  pub group: Option<String>,
  pub version: Option<String>,
  pub base_dir: Option<PathBuf>,
  /// Default packaging kind for `package` requests without a type.
  pub packaging: Option<String>,
  pub description: Option<String>,
  pub dependencies: Vec<String>,
  /// Commands run by the project's `build` task.
  pub build: Vec<Vec<String>>,
  /// Commands run by the process-wide `integration` task.
  pub integration: Vec<Vec<String>>,
}

#[derive(Debug)]
pub struct Project {
  key: ProjectId,
  name: String,
  parent: Option<ProjectId>,
  children: Vec<ProjectId>,
  group: Option<String>,
  version: Option<String>,
  base_dir: PathBuf,
  packaging: Option<String>,
  description: Option<String>,
  dependencies: Vec<Dependency>,
  build: Vec<Vec<String>>,
  integration: Vec<Vec<String>>,
  packages: Vec<Arc<Package>>,
}

impl Project {
  pub fn key(&self) -> ProjectId {
    self.key
  }

  /// Full hierarchical name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Last segment of the name.
  pub fn short_name(&self) -> &str {
    self
      .name
      .rsplit(PROJECT_SEPARATOR)
      .next()
      .unwrap_or(&self.name)
  }

  /// Artifact id: the name with hierarchy separators replaced by dashes.
  pub fn id(&self) -> String {
    project_id(&self.name)
  }

  pub fn parent(&self) -> Option<ProjectId> {
    self.parent
  }

  pub fn children(&self) -> &[ProjectId] {
    &self.children
  }

  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  pub fn target_dir(&self) -> PathBuf {
    self.base_dir.join(TARGET_DIR)
  }

  /// Compiled output packaged by the default strategies.
  pub fn output_dir(&self) -> PathBuf {
    self.target_dir().join(OUTPUT_DIR)
  }

  pub fn sources_dir(&self) -> PathBuf {
    self.base_dir.join(SOURCES_DIR)
  }

  pub fn docs_dir(&self) -> PathBuf {
    self.target_dir().join(DOCS_DIR)
  }

  /// Resolve `path` against the base dir.
  pub fn path_to(&self, path: impl AsRef<Path>) -> PathBuf {
    self.base_dir.join(path)
  }

  pub fn packaging(&self) -> Option<&str> {
    self.packaging.as_deref()
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn dependencies(&self) -> &[Dependency] {
    &self.dependencies
  }

  pub fn build_commands(&self) -> &[Vec<String>] {
    &self.build
  }

  pub fn integration_commands(&self) -> &[Vec<String>] {
    &self.integration
  }

  /// Packages declared on this project, in declaration order.
  pub fn packages(&self) -> &[Arc<Package>] {
    &self.packages
  }

  pub(crate) fn push_package(&mut self, package: Arc<Package>) {
    self.packages.push(package);
  }

  pub fn set_group(&mut self, group: impl Into<String>) {
    self.group = Some(group.into());
  }

  pub fn set_version(&mut self, version: impl Into<String>) {
    self.version = Some(version.into());
  }
}

/// `foo:bar` becomes `foo-bar`.
pub fn project_id(name: &str) -> String {
  name.replace(PROJECT_SEPARATOR, "-")
}

/// All projects of one build, in definition order.
#[derive(Debug, Default)]
pub struct Workspace {
  projects: Vec<Project>,
  by_name: HashMap<String, ProjectId>,
}

impl Workspace {
  pub fn new() -> Self {
    Self::default()
  }

  /// Define a project. A name containing `:` makes the prefix its parent,
  /// which must already exist.
  pub fn define(&mut self, name: &str, options: ProjectOptions) -> Result<ProjectId, ProjectError> {
    if self.by_name.contains_key(name) {
      return Err(ProjectError::DuplicateProject(name.to_string()));
    }

    let parent = match name.rsplit_once(PROJECT_SEPARATOR) {
      Some((parent_name, _)) => Some(self.find(parent_name).ok_or_else(|| ProjectError::ParentNotFound {
        name: name.to_string(),
        parent: parent_name.to_string(),
      })?),
      None => None,
    };

    let short = name.rsplit(PROJECT_SEPARATOR).next().unwrap_or(name);
    let base_dir = match (options.base_dir, parent) {
      (Some(dir), Some(parent)) if dir.is_relative() => self.get(parent).base_dir.join(dir),
      (Some(dir), _) => dir,
      (None, Some(parent)) => self.get(parent).base_dir.join(short),
      (None, None) => return Err(ProjectError::MissingBaseDir(name.to_string())),
    };

    let key = ProjectId(self.projects.len());
    let project = Project {
      key,
      name: name.to_string(),
      parent,
      children: Vec::new(),
      group: options.group,
      version: options.version,
      base_dir,
      packaging: options.packaging,
      description: options.description,
      dependencies: options.dependencies.iter().map(|d| Dependency::parse(d)).collect(),
      build: options.build,
      integration: options.integration,
      packages: Vec::new(),
    };

    debug!(project = %name, base_dir = %project.base_dir.display(), "defined project");
    self.projects.push(project);
    self.by_name.insert(name.to_string(), key);
    if let Some(parent) = parent {
      self.projects[parent.0].children.push(key);
    }
    Ok(key)
  }

  pub fn get(&self, key: ProjectId) -> &Project {
    &self.projects[key.0]
  }

  pub fn get_mut(&mut self, key: ProjectId) -> &mut Project {
    &mut self.projects[key.0]
  }

  pub fn find(&self, name: &str) -> Option<ProjectId> {
    self.by_name.get(name).copied()
  }

  pub fn lookup(&self, name: &str) -> Result<&Project, ProjectError> {
    self
      .find(name)
      .map(|key| self.get(key))
      .ok_or_else(|| ProjectError::ProjectNotFound(name.to_string()))
  }

  pub fn iter(&self) -> impl Iterator<Item = &Project> {
    self.projects.iter()
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.projects.is_empty()
  }

  /// Top-level projects.
  pub fn roots(&self) -> Vec<ProjectId> {
    self.projects.iter().filter(|p| p.parent.is_none()).map(|p| p.key).collect()
  }

  /// Topmost ancestor of `key`.
  pub fn root_of(&self, key: ProjectId) -> ProjectId {
    let mut current = key;
    while let Some(parent) = self.get(current).parent {
      current = parent;
    }
    current
  }

  fn ancestors(&self, key: ProjectId) -> impl Iterator<Item = &Project> {
    let mut next = Some(key);
    std::iter::from_fn(move || {
      let project = self.get(next?);
      next = project.parent;
      Some(project)
    })
  }

  /// Effective group: nearest explicit group, else the root project's name.
  pub fn group(&self, key: ProjectId) -> String {
    self
      .ancestors(key)
      .find_map(|p| p.group.clone())
      .unwrap_or_else(|| self.get(self.root_of(key)).name.clone())
  }

  /// Effective version: nearest explicit version, if any.
  pub fn version(&self, key: ProjectId) -> Option<String> {
    self.ancestors(key).find_map(|p| p.version.clone())
  }

  /// Deepest project whose base dir contains `dir`.
  pub fn project_containing(&self, dir: &Path) -> Option<ProjectId> {
    self
      .projects
      .iter()
      .filter(|p| dir.starts_with(&p.base_dir))
      .max_by_key(|p| p.base_dir.components().count())
      .map(|p| p.key)
  }
}
