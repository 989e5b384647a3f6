//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Manifest with a root project and one child.
pub const WORKSPACE: &str = r#"
[project]
name = "app"
group = "org.example"
version = "1.0"
packages = ["zip"]
dependencies = ["org.example:app-util:zip:1.0", "org.other:lib:zip:3.1", "vendor/tool.zip"]

[[project.projects]]
name = "util"
packages = ["zip", "sources"]
"#;

/// Isolated test environment.
///
/// Each test gets its own workspace, local repository and release repository.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create a workspace with `manifest` and some compiled output.
  pub fn with_manifest(manifest: &str) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("parcel.toml", manifest);
    env.write_file("target/out/app.txt", "app");
    env.write_file("util/target/out/util.txt", "util");
    env.write_file("util/src/util.c", "int util;");
    env
  }

  /// Write a file relative to the workspace root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.ws().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Workspace root.
  pub fn ws(&self) -> PathBuf {
    let p = self.temp.path().join("ws");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Local repository (isolated per test).
  pub fn repo(&self) -> PathBuf {
    self.temp.path().join("repo")
  }

  /// Directory release target.
  pub fn release(&self) -> PathBuf {
    self.temp.path().join("release")
  }

  /// A pre-configured command running in the workspace root.
  ///
  /// Sets environment variables for isolated testing:
  /// - `PARCEL_LOCAL_REPO`: isolated local repository
  /// - `PARCEL_RELEASE_REPO`: isolated release directory
  pub fn parcel_cmd(&self) -> Command {
    self.parcel_cmd_in(&self.ws())
  }

  pub fn parcel_cmd_in(&self, dir: &Path) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("parcel");
    cmd.current_dir(dir);
    cmd.arg("--manifest").arg(self.ws().join("parcel.toml"));
    cmd.env("PARCEL_LOCAL_REPO", self.repo());
    cmd.env("PARCEL_RELEASE_REPO", self.release());
    cmd.env_remove("PARCEL_INTEGRATION");
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Find a file by name below `dir`.
  pub fn find(&self, dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
      let path = entry.path();
      if path.is_dir() {
        if let Some(found) = self.find(&path, name) {
          return Some(found);
        }
      } else if path.file_name().is_some_and(|n| n == name) {
        return Some(path);
      }
    }
    None
  }
}
