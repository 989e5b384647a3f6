//! Install, uninstall, upload and the integration hook, driven from a manifest.

use std::fs;

use parcel_lib::execute::{ExecuteError, RunReport};
use parcel_lib::task::{Lifecycle, file_task_name};

use super::common::Fixture;

const APP: &str = r#"
[project]
name = "app"
group = "org.example"
version = "1.0"
packages = ["zip"]
"#;

fn assert_success(report: &RunReport) {
  assert!(
    report.is_success(),
    "failed: {:?}, skipped: {:?}",
    report.failed,
    report.skipped
  );
}

#[tokio::test]
async fn install_copies_package_and_descriptor() {
  let fx = Fixture::new();
  fx.write("target/out/app.txt", "hello");
  let session = fx.session(APP, fx.config());
  let package = session.packages().next().unwrap().clone();

  let report = session.run(Lifecycle::Install, None).await.unwrap();
  assert_success(&report);

  assert_eq!(package.installed, fx.repo().join("org/example/app/1.0/app-1.0.zip"));
  assert!(package.installed.is_file());
  assert!(package.installed_descriptor.is_file());
  assert_eq!(fs::read(&package.installed).unwrap(), fs::read(&package.path).unwrap());

  let pom = fs::read_to_string(&package.installed_descriptor).unwrap();
  assert!(pom.contains("<artifactId>app</artifactId>"));
  assert!(pom.contains("<version>1.0</version>"));
}

#[tokio::test]
async fn reinstall_is_up_to_date() {
  let fx = Fixture::new();
  fx.write("target/out/app.txt", "hello");
  let session = fx.session(APP, fx.config());
  let package = session.packages().next().unwrap().clone();

  assert_success(&session.run(Lifecycle::Install, None).await.unwrap());

  // Same session: nothing runs again.
  let again = session.run(Lifecycle::Install, None).await.unwrap();
  assert!(again.completed.is_empty());

  session.reset_ledger();
  let fresh = session.run(Lifecycle::Install, None).await.unwrap();
  assert_success(&fresh);
  assert!(fresh.up_to_date.contains(&file_task_name(&package.installed)));
  assert!(fresh.up_to_date.contains(&file_task_name(&package.installed_descriptor)));
}

#[tokio::test]
async fn uninstall_removes_installed_files() {
  let fx = Fixture::new();
  fx.write("target/out/app.txt", "hello");
  let session = fx.session(APP, fx.config());
  let package = session.packages().next().unwrap().clone();

  assert_success(&session.run(Lifecycle::Install, None).await.unwrap());
  assert_success(&session.run(Lifecycle::Uninstall, None).await.unwrap());
  assert!(!package.installed.exists());
  assert!(!package.installed_descriptor.exists());

  session.reset_ledger();
  assert_success(&session.run(Lifecycle::Uninstall, None).await.unwrap());
}

#[tokio::test]
async fn upload_to_directory_release() {
  let fx = Fixture::new();
  fx.write("target/out/app.txt", "hello");
  let session = fx.session(APP, fx.config());

  assert_success(&session.run(Lifecycle::Upload, None).await.unwrap());

  let dir = fx.release().join("org/example/app/1.0");
  assert!(dir.join("app-1.0.zip").is_file());
  assert!(dir.join("app-1.0.pom").is_file());
}

#[tokio::test]
async fn failed_package_upload_keeps_uploaded_descriptor() {
  let fx = Fixture::new();
  fx.write("target/out/app.txt", "hello");
  let session = fx.session(APP, fx.config());
  let package = session.packages().next().unwrap().clone();

  assert_success(&session.run(Lifecycle::Package, None).await.unwrap());
  fs::remove_file(&package.path).unwrap();

  let report = session.run(Lifecycle::Upload, None).await.unwrap();
  assert_eq!(report.failed_names(), vec!["app:upload"]);
  match &report.failed[0].1 {
    ExecuteError::Task { task, project, source } => {
      assert_eq!(task, "app:upload");
      assert_eq!(project.as_deref(), Some("app"));
      assert!(matches!(&**source, ExecuteError::MissingFile(path) if path == &package.path));
    }
    other => panic!("unexpected error: {other}"),
  }

  let dir = fx.release().join("org/example/app/1.0");
  assert!(dir.join("app-1.0.pom").is_file());
  assert!(!dir.join("app-1.0.zip").exists());
}

#[tokio::test]
async fn upload_without_release_target_fails() {
  let fx = Fixture::new();
  fx.write("target/out/app.txt", "hello");
  let mut config = fx.config();
  config.release = None;
  let session = fx.session(APP, config);

  let report = session.run(Lifecycle::Upload, None).await.unwrap();
  assert_eq!(report.failed_names(), vec!["app:upload"]);
  match &report.failed[0].1 {
    ExecuteError::Task { project, source, .. } => {
      assert_eq!(project.as_deref(), Some("app"));
      assert!(matches!(**source, ExecuteError::NoReleaseTarget));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[tokio::test]
async fn unknown_target_is_an_error() {
  let fx = Fixture::new();
  let session = fx.session(APP, fx.config());
  let err = session.invoke(vec!["nope".into()]).await.unwrap_err();
  assert!(matches!(err, ExecuteError::Graph(_)));
}

#[cfg(unix)]
mod commands {
  use super::*;

  const WITH_COMMANDS: &str = r#"
[project]
name = "app"
version = "1.0"
packages = ["zip"]
build = [["sh", "-c", "mkdir -p target/out && echo built > target/out/app.txt && echo build >> build.log"]]
integration = [["sh", "-c", "echo run >> it.log"]]

[[project.projects]]
name = "util"
packages = ["zip"]
"#;

  #[tokio::test]
  async fn build_commands_feed_the_package() {
    let fx = Fixture::new();
    let session = fx.session(WITH_COMMANDS, fx.config());
    let package = session.packages().next().unwrap().clone();

    assert_success(&session.run(Lifecycle::Package, None).await.unwrap());
    assert_eq!(fx.read("build.log"), "build\n");
    assert!(package.path.is_file());
    assert_eq!(fx.read("it.log"), "", "integration is off by default");
  }

  #[tokio::test]
  async fn integration_hook_runs_once() {
    let fx = Fixture::new();
    let mut config = fx.config();
    config.integration = true;
    let session = fx.session(WITH_COMMANDS, config);

    assert_success(&session.run(Lifecycle::Install, None).await.unwrap());
    assert_eq!(fx.read("it.log"), "run\n");
    assert_eq!(fx.read("build.log"), "build\n");
  }

  #[tokio::test]
  async fn subproject_package_skips_integration() {
    let fx = Fixture::new();
    let mut config = fx.config();
    config.integration = true;
    let session = fx.session(WITH_COMMANDS, config);

    assert_success(&session.run(Lifecycle::Package, Some("app:util")).await.unwrap());
    assert_eq!(fx.read("it.log"), "");
  }

  #[tokio::test]
  async fn failing_build_skips_packaging_and_install() {
    let fx = Fixture::new();
    let session = fx.session(
      r#"
[project]
name = "app"
version = "1.0"
packages = ["zip"]
build = [["sh", "-c", "exit 1"]]
"#,
      fx.config(),
    );
    let package = session.packages().next().unwrap().clone();

    let report = session.run(Lifecycle::Install, None).await.unwrap();
    assert_eq!(report.failed_names(), vec!["app:build"]);
    for task in ["app:package", "app:install", "package", "install"] {
      assert!(report.skipped.contains_key(task), "{task} not skipped");
    }
    assert!(!package.path.exists());
    assert!(!package.installed.exists());

    // Failed tasks are retried by the next invocation.
    let retry = session.run(Lifecycle::Build, Some("app")).await.unwrap();
    assert_eq!(retry.failed_names(), vec!["app:build"]);
  }
}
