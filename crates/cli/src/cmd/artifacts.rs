//! Implementation of `parcel artifacts`.

use std::path::Path;

use anyhow::Result;

use parcel_lib::execute::ExecuteConfig;
use parcel_lib::package::Package;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

pub fn cmd_artifacts(manifest: &Path, config: ExecuteConfig, format: OutputFormat) -> Result<()> {
  let session = super::load(manifest, config)?;
  let packages: Vec<&Package> = session.packages().map(|p| p.as_ref()).collect();

  if format.is_json() {
    return print_json(&packages);
  }

  if packages.is_empty() {
    print_info("No packages declared.");
    return Ok(());
  }
  for package in packages {
    print_info(&package.spec.to_string());
    print_stat("Project", &package.project);
    print_stat("Path", &package.path.display().to_string());
    print_stat("Installed", &package.installed.display().to_string());
  }
  Ok(())
}
