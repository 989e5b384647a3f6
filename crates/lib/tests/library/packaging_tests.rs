//! Archive contents and package layout.

use parcel_lib::archive::{ArchiveFormat, list_entries};
use parcel_lib::execute::RunReport;
use parcel_lib::task::Lifecycle;

use super::common::Fixture;

fn assert_success(report: &RunReport) {
  assert!(report.is_success(), "failed: {:?}", report.failed);
}

#[tokio::test]
async fn archives_hold_project_directories() {
  let fx = Fixture::new();
  fx.write("target/out/app.txt", "compiled");
  fx.write("target/out/lib/core.txt", "core");
  fx.write("src/main.c", "int main;");
  fx.write("LICENSE", "MIT");
  let session = fx.session(
    r#"
[project]
name = "app"
group = "org.example"
version = "2.0"
packages = [
  { type = "zip", include = [{ source = "LICENSE", dest = "META" }] },
  "sources",
  "tgz",
]
"#,
    fx.config(),
  );

  assert_success(&session.run(Lifecycle::Package, None).await.unwrap());

  let packages: Vec<_> = session.packages().cloned().collect();
  assert_eq!(packages.len(), 3);

  let zip = &packages[0];
  assert_eq!(zip.path.file_name().unwrap(), "app-2.0.zip");
  let mut names = list_entries(&zip.path, ArchiveFormat::Zip).unwrap();
  names.sort();
  assert_eq!(names, vec!["META/LICENSE", "app.txt", "lib/core.txt"]);

  let sources = &packages[1];
  assert_eq!(sources.spec.classifier.as_deref(), Some("sources"));
  assert_eq!(sources.path.file_name().unwrap(), "app-2.0-sources.zip");
  assert_eq!(list_entries(&sources.path, ArchiveFormat::Zip).unwrap(), vec!["main.c"]);

  let tgz = &packages[2];
  let mut names = list_entries(&tgz.path, ArchiveFormat::TarGz).unwrap();
  names.sort();
  assert_eq!(names, vec!["app.txt", "lib/core.txt"]);

  // Every package has its descriptor beside it.
  for package in &packages {
    assert!(package.descriptor.is_file(), "{} missing", package.descriptor.display());
    assert_eq!(package.descriptor.parent(), package.path.parent());
  }
}

#[tokio::test]
async fn package_paths_are_spec_addressed() {
  let fx = Fixture::new();
  let session = fx.session(
    r#"
[project]
name = "app"
version = "1.0"
packages = ["zip", { type = "zip", classifier = "bin" }]

[[project.projects]]
name = "util"
packages = ["zip"]
"#,
    fx.config(),
  );

  let packages: Vec<_> = session.packages().cloned().collect();
  let dirs: Vec<_> = packages.iter().map(|p| p.path.parent().unwrap().to_path_buf()).collect();
  assert_ne!(dirs[0], dirs[1]);
  assert!(packages[0].path.starts_with(fx.ws().join("target/pkg")));
  assert!(packages[2].path.starts_with(fx.ws().join("util/target/pkg")));
  assert_eq!(packages[2].spec.id, "app-util");
  assert_eq!(packages[2].spec.group, "app");
}

#[tokio::test]
async fn merged_zip_keeps_first_entry() {
  let fx = Fixture::new();
  fx.write("target/out/readme.txt", "outer");
  let vendor = parcel_lib::archive::write_archive(
    &fx.ws().join("vendor.zip"),
    ArchiveFormat::Zip,
    &[parcel_lib::archive::ArchiveEntry::new(fx.ws().join("target/out"))],
  );
  assert_eq!(vendor.unwrap(), 1);
  fx.write("extra/more.txt", "more");

  let session = fx.session(
    r#"
[project]
name = "app"
version = "1.0"
packages = [{ type = "zip", include = [{ source = "vendor.zip", merge = true }, { source = "extra" }] }]
"#,
    fx.config(),
  );
  assert_success(&session.run(Lifecycle::Package, None).await.unwrap());

  let package = session.packages().next().unwrap();
  let mut names = list_entries(&package.path, ArchiveFormat::Zip).unwrap();
  names.sort();
  assert_eq!(names, vec!["more.txt", "readme.txt"]);
}
