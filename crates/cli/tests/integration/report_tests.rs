//! Tests for the reporting commands: artifacts, tasks, classify, export.

use predicates::prelude::*;

use super::common::{TestEnv, WORKSPACE};

fn json(output: &[u8]) -> serde_json::Value {
  serde_json::from_slice(output).unwrap()
}

#[test]
fn artifacts_lists_packages() {
  let env = TestEnv::with_manifest(WORKSPACE);

  env
    .parcel_cmd()
    .arg("artifacts")
    .assert()
    .success()
    .stdout(predicate::str::contains("org.example:app:zip:1.0"))
    .stdout(predicate::str::contains("org.example:app-util:zip:sources:1.0"));

  let output = env.parcel_cmd().args(["artifacts", "--output", "json"]).output().unwrap();
  assert!(output.status.success());
  let packages = json(&output.stdout);
  assert_eq!(packages.as_array().unwrap().len(), 3);
  assert_eq!(packages[0]["spec"]["id"], "app");
  assert_eq!(packages[0]["project"], "app");
}

#[test]
fn tasks_shows_prerequisites() {
  let env = TestEnv::with_manifest(WORKSPACE);

  let output = env.parcel_cmd().args(["tasks", "--output", "json"]).output().unwrap();
  assert!(output.status.success());
  let tasks = json(&output.stdout);
  let install = tasks
    .as_array()
    .unwrap()
    .iter()
    .find(|t| t["name"] == "app:install")
    .unwrap();
  let prereqs: Vec<&str> = install["prerequisites"]
    .as_array()
    .unwrap()
    .iter()
    .filter_map(|v| v.as_str())
    .collect();
  assert!(prereqs.contains(&"app:package"));
  assert!(prereqs.contains(&"app:util:install"));

  env
    .parcel_cmd()
    .arg("tasks")
    .assert()
    .success()
    .stdout(predicate::str::contains("integration"));
}

#[test]
fn classify_partitions_dependencies() {
  let env = TestEnv::with_manifest(WORKSPACE);

  let output = env
    .parcel_cmd()
    .args(["classify", "--project", "app", "--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());
  let parts = json(&output.stdout);
  assert_eq!(parts["workspace_modules"], serde_json::json!(["app:util"]));
  assert_eq!(parts["repo_artifacts"][0]["spec"]["id"], "lib");
  assert_eq!(parts["local_files"].as_array().unwrap().len(), 1);
}

#[test]
fn export_writes_then_skips_fresh_files() {
  let env = TestEnv::with_manifest(WORKSPACE);

  env
    .parcel_cmd()
    .arg("export")
    .assert()
    .success()
    .stdout(predicate::str::contains("Exported 3 file(s)"));
  assert!(env.ws().join("app.parcel-workspace.json").is_file());
  assert!(env.ws().join("util/app-util.parcel-module.json").is_file());

  env
    .parcel_cmd()
    .arg("export")
    .assert()
    .success()
    .stdout(predicate::str::contains("Exported 0 file(s)"));

  env
    .parcel_cmd()
    .args(["export", "--force"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Exported 3 file(s)"));
}
