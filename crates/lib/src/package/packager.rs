//! Packaging strategies and their registry.
//!
//! A strategy turns an output path into the task that produces it, and may
//! rewrite the artifact spec before the path is derived. Strategies register
//! by type name; the built-in ones are present in every registry.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::{ArchiveEntry, ArchiveFormat};
use crate::artifact::ArtifactSpec;
use crate::project::Project;
use crate::task::{Action, Task};

pub trait Packager: Send + Sync {
  /// Build the task producing the package at `path`.
  fn materialize(&self, project: &Project, path: &Path) -> Task;

  /// Adjust the resolved spec before the output path is derived.
  fn rewrite_spec(&self, spec: ArtifactSpec) -> ArtifactSpec {
    spec
  }
}

/// Which project directory an archive strategy packs by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contents {
  Output,
  Sources,
  Docs,
}

impl Contents {
  fn dir(&self, project: &Project) -> PathBuf {
    match self {
      Contents::Output => project.output_dir(),
      Contents::Sources => project.sources_dir(),
      Contents::Docs => project.docs_dir(),
    }
  }
}

/// Archive strategy used by all built-in packaging kinds.
#[derive(Debug, Clone)]
pub struct ArchivePackager {
  format: ArchiveFormat,
  contents: Contents,
  /// `(type, classifier)` forced onto the spec.
  rewrite: Option<(&'static str, &'static str)>,
}

impl ArchivePackager {
  pub fn new(format: ArchiveFormat, contents: Contents) -> Self {
    Self {
      format,
      contents,
      rewrite: None,
    }
  }

  pub fn zip() -> Self {
    Self::new(ArchiveFormat::Zip, Contents::Output)
  }

  pub fn tar() -> Self {
    Self::new(ArchiveFormat::Tar, Contents::Output)
  }

  pub fn tgz() -> Self {
    Self::new(ArchiveFormat::TarGz, Contents::Output)
  }

  pub fn sources() -> Self {
    Self {
      rewrite: Some(("zip", "sources")),
      ..Self::new(ArchiveFormat::Zip, Contents::Sources)
    }
  }

  pub fn docs() -> Self {
    Self {
      rewrite: Some(("zip", "docs")),
      ..Self::new(ArchiveFormat::Zip, Contents::Docs)
    }
  }

  pub fn format(&self) -> ArchiveFormat {
    self.format
  }
}

impl Packager for ArchivePackager {
  fn materialize(&self, project: &Project, path: &Path) -> Task {
    Task::file(path, Some(project.name())).with_action(Action::Archive {
      output: path.to_path_buf(),
      format: self.format,
      entries: vec![ArchiveEntry::new(self.contents.dir(project))],
    })
  }

  fn rewrite_spec(&self, spec: ArtifactSpec) -> ArtifactSpec {
    match self.rewrite {
      Some((kind, classifier)) => ArtifactSpec {
        kind: kind.to_string(),
        classifier: Some(classifier.to_string()),
        ..spec
      },
      None => spec,
    }
  }
}

/// Strategies keyed by packaging type name.
#[derive(Clone)]
pub struct PackagerRegistry {
  packagers: HashMap<String, Arc<dyn Packager>>,
}

impl Default for PackagerRegistry {
  fn default() -> Self {
    let mut registry = Self::empty();
    registry.register("zip", Arc::new(ArchivePackager::zip()));
    registry.register("tar", Arc::new(ArchivePackager::tar()));
    registry.register("tgz", Arc::new(ArchivePackager::tgz()));
    registry.register("sources", Arc::new(ArchivePackager::sources()));
    registry.register("docs", Arc::new(ArchivePackager::docs()));
    registry
  }
}

impl PackagerRegistry {
  /// Registry with the built-in strategies.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn empty() -> Self {
    Self {
      packagers: HashMap::new(),
    }
  }

  /// Register a strategy, replacing any existing one of the same name.
  pub fn register(&mut self, name: impl Into<String>, packager: Arc<dyn Packager>) {
    self.packagers.insert(name.into(), packager);
  }

  pub fn get(&self, name: &str) -> Option<Arc<dyn Packager>> {
    self.packagers.get(name).cloned()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.packagers.contains_key(name)
  }

  /// Registered names, sorted.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.packagers.keys().cloned().collect();
    names.sort();
    names
  }
}

impl fmt::Debug for PackagerRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PackagerRegistry").field("packagers", &self.names()).finish()
  }
}
