//! Implementation of `parcel export`.

use std::path::Path;

use anyhow::{Context, Result};

use parcel_lib::execute::ExecuteConfig;
use parcel_lib::export::{ExportOptions, export};

use crate::output::{OutputFormat, print_json, print_stat, print_success};

pub fn cmd_export(manifest: &Path, config: ExecuteConfig, force: bool, format: OutputFormat) -> Result<()> {
  let session = super::load(manifest, config)?;
  let tracked = dunce::canonicalize(manifest).unwrap_or_else(|_| manifest.to_path_buf());

  let report = export(
    &session,
    &ExportOptions {
      tracked: vec![tracked],
      force,
    },
  )
  .context("Export failed")?;

  if format.is_json() {
    return print_json(&serde_json::json!({
      "written": report.written,
      "unchanged": report.unchanged,
    }));
  }

  print_success(&format!("Exported {} file(s)", report.written.len()));
  for path in &report.written {
    print_stat("Wrote", &path.display().to_string());
  }
  if !report.unchanged.is_empty() {
    print_stat("Unchanged", &report.unchanged.len().to_string());
  }
  Ok(())
}
