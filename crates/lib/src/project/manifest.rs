//! `parcel.toml` loading.
//!
//! A manifest declares one top-level project, its nested projects and the
//! packages each of them produces. Loading defines everything on a fresh
//! [`BuildSession`] in declaration order, parents before children.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::archive::ArchiveEntry;
use crate::artifact::LocalRepository;
use crate::consts::PROJECT_SEPARATOR;
use crate::execute::ExecuteConfig;
use crate::package::{PackageError, PackageRequest};
use crate::project::ProjectOptions;
use crate::session::BuildSession;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {}: {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid package on project '{project}': {message}")]
  InvalidPackage { project: String, message: String },

  #[error(transparent)]
  Package(#[from] PackageError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
  project: ProjectDecl,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectDecl {
  name: String,
  group: Option<String>,
  version: Option<String>,
  packaging: Option<String>,
  description: Option<String>,
  base_dir: Option<PathBuf>,
  #[serde(default)]
  dependencies: Vec<String>,
  #[serde(default)]
  build: Vec<Vec<String>>,
  #[serde(default)]
  integration: Vec<Vec<String>>,
  /// Either a packaging type or a table of artifact attributes.
  #[serde(default)]
  packages: Vec<toml::Value>,
  #[serde(default)]
  projects: Vec<ProjectDecl>,
}

/// A parsed package declaration.
#[derive(Debug, Default)]
struct PackageDecl {
  request: PackageRequest,
  include: Vec<ArchiveEntry>,
}

/// Load a manifest into a session using the local repository from the
/// environment.
pub fn load_session(path: &Path, config: ExecuteConfig) -> Result<BuildSession, ManifestError> {
  load_session_with(path, LocalRepository::from_env(), config)
}

pub fn load_session_with(
  path: &Path,
  repository: LocalRepository,
  config: ExecuteConfig,
) -> Result<BuildSession, ManifestError> {
  let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let manifest: Manifest = toml::from_str(&content).map_err(|source| ManifestError::Parse {
    path: path.to_path_buf(),
    source,
  })?;

  let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
  let root = dunce::canonicalize(parent).map_err(|source| ManifestError::Io {
    path: parent.to_path_buf(),
    source,
  })?;

  let mut session = BuildSession::new(repository, config).map_err(PackageError::from)?;
  define(&mut session, manifest.project, None, &root)?;

  info!(
    manifest = %path.display(),
    projects = session.workspace().len(),
    packages = session.packages().count(),
    "loaded manifest"
  );
  Ok(session)
}

fn define(
  session: &mut BuildSession,
  decl: ProjectDecl,
  parent: Option<&str>,
  root: &Path,
) -> Result<(), ManifestError> {
  let name = match parent {
    Some(parent) => format!("{parent}{PROJECT_SEPARATOR}{}", decl.name),
    None => decl.name,
  };
  // The top-level project defaults to the manifest's directory.
  let base_dir = match (decl.base_dir, parent) {
    (Some(dir), None) if dir.is_relative() => Some(root.join(dir)),
    (None, None) => Some(root.to_path_buf()),
    (dir, _) => dir,
  };

  let key = session.define_project(
    &name,
    ProjectOptions {
      group: decl.group,
      version: decl.version,
      base_dir,
      packaging: decl.packaging,
      description: decl.description,
      dependencies: decl.dependencies,
      build: decl.build,
      integration: decl.integration,
    },
  )?;

  for value in &decl.packages {
    let package_decl = parse_package(&name, value)?;
    let package = session.declare_package(key, &package_decl.request)?;
    let project = session.workspace().get(key);
    let entries: Vec<ArchiveEntry> = package_decl
      .include
      .into_iter()
      .map(|entry| ArchiveEntry {
        source: project.path_to(&entry.source),
        ..entry
      })
      .collect();
    for entry in entries {
      session.include(&package, entry)?;
    }
  }

  debug!(project = %name, children = decl.projects.len(), "defined manifest project");
  for child in decl.projects {
    define(session, child, Some(&name), root)?;
  }
  Ok(())
}

fn parse_package(project: &str, value: &toml::Value) -> Result<PackageDecl, ManifestError> {
  let invalid = |message: String| ManifestError::InvalidPackage {
    project: project.to_string(),
    message,
  };

  let table = match value {
    toml::Value::String(kind) => {
      return Ok(PackageDecl {
        request: PackageRequest::of_kind(kind.as_str()),
        include: Vec::new(),
      });
    }
    toml::Value::Table(table) => table,
    other => return Err(invalid(format!("expected a type name or a table, found {}", other.type_str()))),
  };

  let mut decl = PackageDecl::default();
  for (key, value) in table {
    if key == "include" {
      decl.include = value
        .clone()
        .try_into()
        .map_err(|e: toml::de::Error| invalid(format!("bad include rules: {e}")))?;
      continue;
    }
    let toml::Value::String(text) = value else {
      return Err(invalid(format!("'{key}' must be a string")));
    };
    decl
      .request
      .overrides
      .set(key, text.clone())
      .map_err(PackageError::from)?;
  }
  Ok(decl)
}
