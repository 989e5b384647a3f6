//! Descriptor ("pom") writer.
//!
//! Emits a minimal Maven-style document: coordinates, packaging, an optional
//! description and the coordinate dependencies of the owning project.

use std::fmt::Write as _;
use std::path::Path;

use tracing::{debug, info};

use crate::execute::actions::write_atomic;
use crate::execute::types::{ActionOutcome, ExecuteError};
use crate::task::DescriptorDoc;

pub fn render_descriptor(doc: &DescriptorDoc) -> String {
  let spec = &doc.spec;
  let mut out = String::new();
  out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
  out.push_str("<project xmlns=\"http://maven.apache.org/POM/4.0.0\">\n");
  out.push_str("  <modelVersion>4.0.0</modelVersion>\n");
  element(&mut out, 1, "groupId", &spec.group);
  element(&mut out, 1, "artifactId", &spec.id);
  if let Some(version) = &spec.version {
    element(&mut out, 1, "version", version);
  }
  element(&mut out, 1, "packaging", &spec.kind);
  if let Some(description) = &doc.description {
    element(&mut out, 1, "description", description);
  }

  if !doc.dependencies.is_empty() {
    out.push_str("  <dependencies>\n");
    for dep in &doc.dependencies {
      out.push_str("    <dependency>\n");
      element(&mut out, 3, "groupId", &dep.group);
      element(&mut out, 3, "artifactId", &dep.id);
      if let Some(version) = &dep.version {
        element(&mut out, 3, "version", version);
      }
      element(&mut out, 3, "type", &dep.kind);
      if let Some(classifier) = &dep.classifier {
        element(&mut out, 3, "classifier", classifier);
      }
      out.push_str("    </dependency>\n");
    }
    out.push_str("  </dependencies>\n");
  }

  out.push_str("</project>\n");
  out
}

fn element(out: &mut String, depth: usize, name: &str, value: &str) {
  let indent = "  ".repeat(depth);
  let _ = writeln!(out, "{indent}<{name}>{}</{name}>", escape(value));
}

fn escape(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&apos;"),
      c => escaped.push(c),
    }
  }
  escaped
}

/// Write the descriptor unless the file already has the same content.
pub async fn write_descriptor(path: &Path, doc: &DescriptorDoc) -> Result<ActionOutcome, ExecuteError> {
  let content = render_descriptor(doc);

  if let Ok(existing) = tokio::fs::read_to_string(path).await
    && existing == content
  {
    debug!(path = %path.display(), "descriptor unchanged");
    return Ok(ActionOutcome::UpToDate);
  }

  write_atomic(path, content.as_bytes()).await?;
  info!(path = %path.display(), spec = %doc.spec, "wrote descriptor");
  Ok(ActionOutcome::Performed)
}
