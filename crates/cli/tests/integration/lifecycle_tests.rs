//! Tests for the lifecycle commands.

use predicates::prelude::*;

use parcel_lib::archive::{ArchiveFormat, list_entries};

use super::common::{TestEnv, WORKSPACE};

#[test]
fn package_writes_archives() {
  let env = TestEnv::with_manifest(WORKSPACE);

  env
    .parcel_cmd()
    .arg("package")
    .assert()
    .success()
    .stdout(predicate::str::contains("package finished"));

  let app = env.find(&env.ws().join("target/pkg"), "app-1.0.zip").unwrap();
  assert_eq!(list_entries(&app, ArchiveFormat::Zip).unwrap(), vec!["app.txt"]);

  let sources = env
    .find(&env.ws().join("util/target/pkg"), "app-util-1.0-sources.zip")
    .unwrap();
  assert_eq!(list_entries(&sources, ArchiveFormat::Zip).unwrap(), vec!["util.c"]);
}

#[test]
fn install_fills_local_repository() {
  let env = TestEnv::with_manifest(WORKSPACE);

  env.parcel_cmd().arg("install").assert().success();

  let dir = env.repo().join("org/example/app/1.0");
  assert!(dir.join("app-1.0.zip").is_file());
  assert!(dir.join("app-1.0.pom").is_file());
  let util = env.repo().join("org/example/app-util/1.0");
  assert!(util.join("app-util-1.0.zip").is_file());
  assert!(util.join("app-util-1.0-sources.zip").is_file());

  env.parcel_cmd().arg("uninstall").assert().success();
  assert!(!dir.join("app-1.0.zip").exists());
  assert!(!util.join("app-util-1.0-sources.zip").exists());
}

#[test]
fn upload_to_release_directory() {
  let env = TestEnv::with_manifest(WORKSPACE);

  env.parcel_cmd().arg("upload").assert().success();

  let dir = env.release().join("org/example/app/1.0");
  assert!(dir.join("app-1.0.zip").is_file());
  assert!(dir.join("app-1.0.pom").is_file());
}

#[test]
fn upload_without_release_repository_fails() {
  let env = TestEnv::with_manifest(WORKSPACE);

  env
    .parcel_cmd()
    .env_remove("PARCEL_RELEASE_REPO")
    .args(["upload", "--project", "app:util"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no release repository configured"))
    .stderr(predicate::str::contains("parcel upload --project app:util"));
}

#[test]
fn current_directory_selects_subproject() {
  let env = TestEnv::with_manifest(WORKSPACE);

  env
    .parcel_cmd_in(&env.ws().join("util"))
    .arg("package")
    .assert()
    .success()
    .stdout(predicate::str::contains("app:util:package finished"));

  assert!(env.find(&env.ws().join("util/target/pkg"), "app-util-1.0.zip").is_some());
  assert!(!env.ws().join("target/pkg").exists());
}

#[test]
fn explicit_project_overrides_directory() {
  let env = TestEnv::with_manifest(WORKSPACE);

  env
    .parcel_cmd()
    .args(["package", "--project", "app:util"])
    .assert()
    .success();
  assert!(!env.ws().join("target/pkg").exists());
}

#[test]
fn unknown_project_fails() {
  let env = TestEnv::with_manifest(WORKSPACE);

  env
    .parcel_cmd()
    .args(["build", "--project", "app:nope"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no such project: app:nope"));
}

#[cfg(unix)]
mod commands {
  use super::*;

  #[test]
  fn failing_build_exits_nonzero_and_installs_nothing() {
    let env = TestEnv::with_manifest(
      r#"
[project]
name = "app"
version = "1.0"
packages = ["zip"]
build = [["sh", "-c", "exit 4"]]
"#,
    );

    env
      .parcel_cmd()
      .arg("install")
      .assert()
      .failure()
      .stderr(predicate::str::contains("app:build"))
      .stderr(predicate::str::contains("parcel install --project app"));

    assert!(!env.repo().exists() || env.find(&env.repo(), "app-1.0.zip").is_none());
  }

  #[test]
  fn integration_flag_runs_integration_commands() {
    let env = TestEnv::with_manifest(
      r#"
[project]
name = "app"
version = "1.0"
packages = ["zip"]
integration = [["sh", "-c", "echo ran >> it.log"]]
"#,
    );

    env.parcel_cmd().arg("package").assert().success();
    assert!(!env.ws().join("it.log").exists());

    env
      .parcel_cmd()
      .args(["package", "--integration"])
      .assert()
      .success();
    assert_eq!(std::fs::read_to_string(env.ws().join("it.log")).unwrap(), "ran\n");
  }
}
