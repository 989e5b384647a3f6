//! Packages: project-produced artifacts and the requests that declare them.

pub mod packager;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::artifact::{ArtifactSpec, SpecError, SpecOverrides};
use crate::project::ProjectError;
use crate::task::{GraphError, file_task_name};

pub use packager::{ArchivePackager, Contents, Packager, PackagerRegistry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackageError {
  #[error("unknown package type '{0}'")]
  UnknownPackageType(String),

  #[error("invalid artifact attribute '{0}'")]
  InvalidAttribute(String),

  #[error("no such project: {0}")]
  ProjectNotFound(String),

  #[error("artifact {spec} is already declared by project '{owner}'")]
  DuplicateArtifact { spec: ArtifactSpec, owner: String },

  #[error("package {0} does not accept inclusion rules")]
  NotIncludable(String),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Spec(SpecError),

  #[error(transparent)]
  Project(#[from] ProjectError),
}

impl From<SpecError> for PackageError {
  fn from(err: SpecError) -> Self {
    match err {
      SpecError::InvalidAttribute(key) => PackageError::InvalidAttribute(key),
      other => PackageError::Spec(other),
    }
  }
}

/// A declared package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
  pub spec: ArtifactSpec,
  /// Strategy that produces the file.
  pub packaging: String,
  /// Output file under the project's target dir.
  pub path: PathBuf,
  /// Companion descriptor next to the package.
  pub descriptor: PathBuf,
  /// Name of the owning project.
  pub project: String,
  /// Local repository location of the installed copy.
  pub installed: PathBuf,
  pub installed_descriptor: PathBuf,
}

impl Package {
  /// Name of the task producing the package file.
  pub fn task_name(&self) -> String {
    file_task_name(&self.path)
  }

  pub fn descriptor_task_name(&self) -> String {
    file_task_name(&self.descriptor)
  }
}

/// A request to package a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRequest {
  /// Packaging type; the project default applies when absent.
  pub kind: Option<String>,
  pub overrides: SpecOverrides,
}

impl PackageRequest {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn of_kind(kind: impl Into<String>) -> Self {
    Self {
      kind: Some(kind.into()),
      overrides: SpecOverrides::default(),
    }
  }

  pub fn with_overrides(mut self, overrides: SpecOverrides) -> Self {
    self.overrides = overrides;
    self
  }

  /// Build a request from string-keyed attributes, rejecting unknown keys.
  pub fn from_pairs<I, K, V>(kind: Option<&str>, pairs: I) -> Result<Self, PackageError>
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
  {
    Ok(Self {
      kind: kind.map(str::to_string),
      overrides: SpecOverrides::from_pairs(pairs)?,
    })
  }
}
