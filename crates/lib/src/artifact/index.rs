//! Index of artifacts produced inside the current build.
//!
//! Every declared package registers itself here together with its descriptor,
//! keyed by spec. Dependency resolution consults the index first, so a
//! coordinate dependency on an in-tree artifact resolves to the package
//! file instead of a repository download.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::artifact::spec::ArtifactSpec;

/// A package and its descriptor as registered in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedArtifact {
  pub spec: ArtifactSpec,
  /// Package file produced by the build.
  pub path: PathBuf,
  /// Companion descriptor file.
  pub descriptor: PathBuf,
  /// Name of the project that declared the package.
  pub project: String,
}

#[derive(Debug, Default)]
pub struct ArtifactIndex {
  entries: BTreeMap<ArtifactSpec, IndexedArtifact>,
}

impl ArtifactIndex {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an artifact, returning the entry it replaced.
  pub fn register(&mut self, artifact: IndexedArtifact) -> Option<IndexedArtifact> {
    debug!(spec = %artifact.spec, path = %artifact.path.display(), "registering artifact");
    let previous = self.entries.insert(artifact.spec.clone(), artifact);
    if let Some(prev) = &previous {
      warn!(spec = %prev.spec, project = %prev.project, "artifact spec registered twice, replacing");
    }
    previous
  }

  pub fn lookup(&self, spec: &ArtifactSpec) -> Option<&IndexedArtifact> {
    self.entries.get(spec)
  }

  pub fn contains(&self, spec: &ArtifactSpec) -> bool {
    self.entries.contains_key(spec)
  }

  /// Find the artifact whose package file is `path`.
  pub fn find_by_path(&self, path: &Path) -> Option<&IndexedArtifact> {
    self.entries.values().find(|a| a.path == path)
  }

  pub fn iter(&self) -> impl Iterator<Item = &IndexedArtifact> {
    self.entries.values()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
