//! Shared fixtures for library tests.

use std::fs;
use std::path::PathBuf;

use parcel_lib::BuildSession;
use parcel_lib::artifact::LocalRepository;
use parcel_lib::execute::{ExecuteConfig, ReleaseTarget};
use parcel_lib::project::manifest::load_session_with;
use tempfile::TempDir;

/// A workspace directory with its own local and release repositories.
pub struct Fixture {
  pub temp: TempDir,
}

impl Fixture {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("ws")).unwrap();
    Self { temp }
  }

  /// Workspace root, canonicalized so it matches project base dirs.
  pub fn ws(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path().join("ws")).unwrap()
  }

  pub fn repo(&self) -> PathBuf {
    self.temp.path().join("repo")
  }

  pub fn release(&self) -> PathBuf {
    self.temp.path().join("release")
  }

  /// Write a file relative to the workspace root.
  pub fn write(&self, relative: &str, content: &str) -> &Self {
    let path = self.ws().join(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    self
  }

  pub fn read(&self, relative: &str) -> String {
    fs::read_to_string(self.ws().join(relative)).unwrap_or_default()
  }

  pub fn config(&self) -> ExecuteConfig {
    ExecuteConfig {
      parallelism: 4,
      integration: false,
      release: Some(ReleaseTarget::Directory(self.release())),
    }
  }

  /// Write `manifest` and load it.
  pub fn session(&self, manifest: &str, config: ExecuteConfig) -> BuildSession {
    self.write("parcel.toml", manifest);
    load_session_with(&self.manifest(), LocalRepository::new(self.repo()), config).unwrap()
  }

  pub fn manifest(&self) -> PathBuf {
    self.ws().join("parcel.toml")
  }
}
