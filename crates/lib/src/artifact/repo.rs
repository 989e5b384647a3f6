//! Local repository addressing.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! └── org/example/          # group, dots become directories
//!     └── util/             # id
//!         └── 2.0/          # version, or `unversioned`
//!             ├── util-2.0.zip
//!             ├── util-2.0-sources.zip
//!             └── util-2.0.pom
//! ```

use std::path::{Path, PathBuf};

use crate::artifact::spec::ArtifactSpec;
use crate::platform::paths::local_repo_dir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepository {
  root: PathBuf,
}

impl LocalRepository {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Repository rooted at `PARCEL_LOCAL_REPO`, or the default location.
  pub fn from_env() -> Self {
    Self::new(local_repo_dir())
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Canonical file path of `spec` in this repository.
  pub fn locate(&self, spec: &ArtifactSpec) -> PathBuf {
    self.root.join(spec.repository_path())
  }

  /// Whether `path` lives inside this repository.
  pub fn contains(&self, path: &Path) -> bool {
    path.starts_with(&self.root)
  }
}
