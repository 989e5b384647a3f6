//! Implementation of `parcel classify`.

use std::path::Path;

use anyhow::Result;

use parcel_lib::classify::{ClasspathEntry, classify, in_tree_packages, resolve_classpath};
use parcel_lib::execute::ExecuteConfig;

use crate::output::{OutputFormat, print_json, symbols};

pub fn cmd_classify(manifest: &Path, config: ExecuteConfig, project: &str, format: OutputFormat) -> Result<()> {
  let session = super::load(manifest, config)?;
  let workspace = session.workspace();
  let target = workspace.lookup(project)?;

  let classpath = resolve_classpath(target, session.index(), session.repository());
  let parts = classify(
    &classpath,
    &in_tree_packages(workspace),
    session.repository().root(),
    &target.target_dir(),
  );

  if format.is_json() {
    return print_json(&parts);
  }

  println!("Workspace modules:");
  for name in &parts.workspace_modules {
    println!("  {} {}", symbols::INFO, name);
  }
  for (title, entries) in [
    ("Repository artifacts", &parts.repo_artifacts),
    ("Generated files", &parts.generated),
    ("Local files", &parts.local_files),
  ] {
    println!("{title}:");
    for entry in entries {
      match entry {
        ClasspathEntry::Artifact { spec, path } => {
          println!("  {} {} {} {}", symbols::INFO, spec, symbols::ARROW, path.display())
        }
        ClasspathEntry::Path { path } => println!("  {} {}", symbols::INFO, path.display()),
      }
    }
  }
  Ok(())
}
