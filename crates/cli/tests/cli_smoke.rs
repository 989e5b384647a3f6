//! CLI smoke tests for parcel.
//!
//! These tests verify that commands run without panicking and return
//! appropriate exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn parcel_cmd() -> Command {
  cargo_bin_cmd!("parcel")
}

#[test]
fn help_flag_works() {
  parcel_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  parcel_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("parcel"));
}

#[test]
fn lifecycle_help_mentions_project() {
  parcel_cmd()
    .args(["install", "--help"])
    .assert()
    .success()
    .stdout(predicate::str::contains("--project"));
}

#[test]
fn missing_manifest_fails() {
  let temp = TempDir::new().unwrap();
  parcel_cmd()
    .current_dir(temp.path())
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load manifest"));
}

#[test]
fn invalid_manifest_fails() {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("parcel.toml"), "[project]\nname = \"app\"\npackages = [\"war\"]\n").unwrap();
  parcel_cmd()
    .current_dir(temp.path())
    .arg("artifacts")
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown package type 'war'"));
}

#[test]
fn unknown_subcommand_fails() {
  parcel_cmd().arg("deploy").assert().failure();
}
