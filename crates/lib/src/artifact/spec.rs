//! Artifact specifications and their resolution from packaging requests.
//!
//! An [`ArtifactSpec`] is the canonical, hashable identity of a package. A
//! packaging request carries a [`SpecOverrides`] value; resolution fills the
//! missing attributes from the owning project and never mutates the request.
//!
//! The output location of a package is derived from the spec alone:
//!
//! ```text
//! <target>/pkg/<short spec hash>/<id>[-<version>][-<classifier>].<type>
//! ```
//!
//! The hash directory keeps the mapping injective while the file name stays
//! readable.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DESCRIPTOR_TYPE, PACKAGES_DIR, UNVERSIONED};
use crate::util::hash::{ObjectHash, hash_bytes};

/// Attribute names accepted in string-keyed override maps.
pub const ATTRIBUTES: &[&str] = &["group", "id", "version", "type", "classifier"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
  /// Override key outside the recognised attribute set.
  #[error("invalid artifact attribute '{0}' (expected one of: group, id, version, type, classifier)")]
  InvalidAttribute(String),

  /// Coordinates string could not be parsed.
  #[error("invalid artifact coordinates '{0}' (expected group:id:type[:classifier]:version)")]
  InvalidCoordinates(String),
}

/// Canonical identity of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactSpec {
  pub group: String,
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub classifier: Option<String>,
}

impl ArtifactSpec {
  pub fn new(group: impl Into<String>, id: impl Into<String>, kind: impl Into<String>) -> Self {
    Self {
      group: group.into(),
      id: id.into(),
      version: None,
      kind: kind.into(),
      classifier: None,
    }
  }

  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = Some(version.into());
    self
  }

  pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
    self.classifier = Some(classifier.into());
    self
  }

  /// Parse `group:id:type:version` or `group:id:type:classifier:version`.
  ///
  /// `group:id:type` is accepted for unversioned artifacts.
  pub fn parse(coords: &str) -> Result<Self, SpecError> {
    let parts: Vec<&str> = coords.split(':').collect();
    if parts.iter().any(|p| p.trim().is_empty()) {
      return Err(SpecError::InvalidCoordinates(coords.to_string()));
    }

    let spec = match parts.as_slice() {
      [group, id, kind] => Self::new(*group, *id, *kind),
      [group, id, kind, version] => Self::new(*group, *id, *kind).with_version(*version),
      [group, id, kind, classifier, version] => Self::new(*group, *id, *kind)
        .with_classifier(*classifier)
        .with_version(*version),
      _ => return Err(SpecError::InvalidCoordinates(coords.to_string())),
    };
    Ok(spec)
  }

  /// Hash over a length-prefixed encoding of every attribute.
  ///
  /// Absent and empty optional attributes encode differently, so distinct
  /// specs never share an encoding.
  pub fn compute_hash(&self) -> ObjectHash {
    let mut encoded = String::new();
    for field in [
      Some(self.group.as_str()),
      Some(self.id.as_str()),
      self.version.as_deref(),
      Some(self.kind.as_str()),
      self.classifier.as_deref(),
    ] {
      match field {
        Some(value) => encoded.push_str(&format!("{}:{};", value.len(), value)),
        None => encoded.push_str("-;"),
      }
    }
    hash_bytes(encoded.as_bytes())
  }

  /// File name used for the package in the project's target dir.
  pub fn file_name(&self) -> String {
    let mut name = self.id.clone();
    if let Some(version) = &self.version {
      name.push('-');
      name.push_str(version);
    }
    if let Some(classifier) = &self.classifier {
      name.push('-');
      name.push_str(classifier);
    }
    format!("{name}.{}", self.kind)
  }

  /// Path of the package relative to the project's target dir.
  pub fn relative_path(&self) -> PathBuf {
    PathBuf::from(PACKAGES_DIR)
      .join(self.compute_hash().short())
      .join(self.file_name())
  }

  /// Spec of the companion descriptor document.
  pub fn descriptor(&self) -> ArtifactSpec {
    ArtifactSpec {
      group: self.group.clone(),
      id: self.id.clone(),
      version: self.version.clone(),
      kind: DESCRIPTOR_TYPE.to_string(),
      classifier: None,
    }
  }

  /// Path segments of the artifact in a repository layout.
  pub fn repository_segments(&self) -> Vec<String> {
    let version = self.version.as_deref().unwrap_or(UNVERSIONED);
    let mut segments: Vec<String> = self
      .group
      .split('.')
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .collect();
    segments.push(self.id.clone());
    segments.push(version.to_string());

    let mut file = format!("{}-{}", self.id, version);
    if let Some(classifier) = &self.classifier {
      file.push('-');
      file.push_str(classifier);
    }
    segments.push(format!("{file}.{}", self.kind));
    segments
  }

  /// Repository layout path, relative to a repository root.
  pub fn repository_path(&self) -> PathBuf {
    self.repository_segments().iter().collect()
  }
}

impl fmt::Display for ArtifactSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.group, self.id, self.kind)?;
    if let Some(classifier) = &self.classifier {
      write!(f, ":{classifier}")?;
    }
    if let Some(version) = &self.version {
      write!(f, ":{version}")?;
    }
    Ok(())
  }
}

/// Attributes a packaging request may pin explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecOverrides {
  #[serde(default)]
  pub group: Option<String>,
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub version: Option<String>,
  #[serde(default, rename = "type")]
  pub kind: Option<String>,
  #[serde(default)]
  pub classifier: Option<String>,
}

/// Values taken from the owning project when an override is absent.
#[derive(Debug, Clone, Copy)]
pub struct SpecDefaults<'a> {
  pub group: &'a str,
  pub id: &'a str,
  pub version: Option<&'a str>,
  pub kind: &'a str,
}

impl SpecOverrides {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build overrides from string keys, rejecting unknown attributes.
  pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, SpecError>
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
  {
    let mut overrides = Self::default();
    for (key, value) in pairs {
      overrides.set(key.as_ref(), value.into())?;
    }
    Ok(overrides)
  }

  /// Set one attribute by name.
  pub fn set(&mut self, key: &str, value: String) -> Result<(), SpecError> {
    let slot = match key {
      "group" => &mut self.group,
      "id" => &mut self.id,
      "version" => &mut self.version,
      "type" => &mut self.kind,
      "classifier" => &mut self.classifier,
      other => return Err(SpecError::InvalidAttribute(other.to_string())),
    };
    *slot = Some(value);
    Ok(())
  }

  pub fn with_group(mut self, group: impl Into<String>) -> Self {
    self.group = Some(group.into());
    self
  }

  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = Some(version.into());
    self
  }

  pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
    self.kind = Some(kind.into());
    self
  }

  pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
    self.classifier = Some(classifier.into());
    self
  }

  /// Resolve into a complete spec, filling gaps from `defaults`.
  pub fn resolve(&self, defaults: SpecDefaults<'_>) -> ArtifactSpec {
    ArtifactSpec {
      group: self.group.clone().unwrap_or_else(|| defaults.group.to_string()),
      id: self.id.clone().unwrap_or_else(|| defaults.id.to_string()),
      version: self.version.clone().or_else(|| defaults.version.map(str::to_string)),
      kind: self.kind.clone().unwrap_or_else(|| defaults.kind.to_string()),
      classifier: self.classifier.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn defaults() -> SpecDefaults<'static> {
    SpecDefaults {
      group: "org.example",
      id: "app-core",
      version: Some("1.0"),
      kind: "zip",
    }
  }

  #[test]
  fn resolve_fills_from_defaults() {
    let spec = SpecOverrides::new().resolve(defaults());
    assert_eq!(
      spec,
      ArtifactSpec::new("org.example", "app-core", "zip").with_version("1.0")
    );
  }

  #[test]
  fn resolve_prefers_overrides_and_leaves_request_untouched() {
    let overrides = SpecOverrides::new().with_id("other").with_classifier("bin");
    let before = overrides.clone();

    let spec = overrides.resolve(defaults());
    assert_eq!(spec.id, "other");
    assert_eq!(spec.classifier.as_deref(), Some("bin"));
    assert_eq!(spec.group, "org.example");
    assert_eq!(overrides, before);
  }

  #[test]
  fn resolve_keeps_absent_version() {
    let spec = SpecOverrides::new().resolve(SpecDefaults {
      version: None,
      ..defaults()
    });
    assert!(spec.version.is_none());
    assert_eq!(spec.file_name(), "app-core.zip");
  }

  #[test]
  fn from_pairs_rejects_unknown_keys() {
    let err = SpecOverrides::from_pairs([("group", "g"), ("flavour", "x")]).unwrap_err();
    assert_eq!(err, SpecError::InvalidAttribute("flavour".to_string()));
  }

  #[test]
  fn from_pairs_accepts_every_attribute() {
    let overrides = SpecOverrides::from_pairs(
      ATTRIBUTES.iter().map(|key| (*key, format!("{key}-value"))),
    )
    .unwrap();
    assert_eq!(overrides.kind.as_deref(), Some("type-value"));
    assert_eq!(overrides.classifier.as_deref(), Some("classifier-value"));
  }

  #[test]
  fn parse_coordinates() {
    assert_eq!(
      ArtifactSpec::parse("org.example:util:zip:2.0").unwrap(),
      ArtifactSpec::new("org.example", "util", "zip").with_version("2.0")
    );
    assert_eq!(
      ArtifactSpec::parse("org.example:util:zip:sources:2.0").unwrap(),
      ArtifactSpec::new("org.example", "util", "zip")
        .with_classifier("sources")
        .with_version("2.0")
    );
    assert_eq!(
      ArtifactSpec::parse("g:a:tar").unwrap(),
      ArtifactSpec::new("g", "a", "tar")
    );
    assert!(ArtifactSpec::parse("g:a").is_err());
    assert!(ArtifactSpec::parse("g::zip:1").is_err());
  }

  #[test]
  fn display_round_trips_through_parse() {
    let spec = ArtifactSpec::new("g", "a", "zip").with_classifier("docs").with_version("3");
    assert_eq!(spec.to_string(), "g:a:zip:docs:3");
    assert_eq!(ArtifactSpec::parse(&spec.to_string()).unwrap(), spec);
  }

  #[test]
  fn same_spec_same_path() {
    let a = ArtifactSpec::new("g", "a", "zip").with_version("1");
    let b = ArtifactSpec::new("g", "a", "zip").with_version("1");
    assert_eq!(a.relative_path(), b.relative_path());
  }

  #[test]
  fn specs_differing_in_any_attribute_get_distinct_paths() {
    let base = ArtifactSpec::new("g", "a", "zip").with_version("1");
    let variants = [
      ArtifactSpec { group: "h".into(), ..base.clone() },
      ArtifactSpec { id: "b".into(), ..base.clone() },
      ArtifactSpec { version: Some("2".into()), ..base.clone() },
      ArtifactSpec { version: None, ..base.clone() },
      ArtifactSpec { kind: "tar".into(), ..base.clone() },
      ArtifactSpec { classifier: Some("sources".into()), ..base.clone() },
      ArtifactSpec { classifier: Some(String::new()), ..base.clone() },
    ];

    let mut paths = vec![base.relative_path()];
    for variant in &variants {
      paths.push(variant.relative_path());
    }
    let unique: std::collections::HashSet<_> = paths.iter().collect();
    assert_eq!(unique.len(), paths.len());
  }

  #[test]
  fn ambiguous_file_names_still_get_distinct_paths() {
    // Both produce the file name "a-1-2.zip".
    let a = ArtifactSpec::new("g", "a-1", "zip").with_version("2");
    let b = ArtifactSpec::new("g", "a", "zip").with_version("1-2");
    assert_eq!(a.file_name(), b.file_name());
    assert_ne!(a.relative_path(), b.relative_path());
  }

  #[test]
  fn relative_path_layout() {
    let spec = ArtifactSpec::new("g", "a", "zip").with_version("1").with_classifier("sources");
    let path = spec.relative_path();
    let components: Vec<_> = path.iter().map(|c| c.to_string_lossy().to_string()).collect();
    assert_eq!(components.len(), 3);
    assert_eq!(components[0], "pkg");
    assert_eq!(components[1], spec.compute_hash().short());
    assert_eq!(components[2], "a-1-sources.zip");
  }

  #[test]
  fn descriptor_drops_classifier() {
    let spec = ArtifactSpec::new("g", "a", "zip").with_version("1").with_classifier("sources");
    let pom = spec.descriptor();
    assert_eq!(pom.kind, "pom");
    assert!(pom.classifier.is_none());
    assert_eq!(pom.version.as_deref(), Some("1"));
  }

  #[test]
  fn repository_layout() {
    let spec = ArtifactSpec::new("org.example", "util", "zip")
      .with_version("2.0")
      .with_classifier("sources");
    assert_eq!(
      spec.repository_segments(),
      vec!["org", "example", "util", "2.0", "util-2.0-sources.zip"]
    );

    let unversioned = ArtifactSpec::new("g", "a", "tar");
    assert_eq!(
      unversioned.repository_path(),
      PathBuf::from("g/a/unversioned/a-unversioned.tar")
    );
  }

  #[test]
  fn overrides_deserialize_rejects_unknown_fields() {
    let parsed: Result<SpecOverrides, _> = serde_json::from_str(r#"{"group":"g","colour":"red"}"#);
    assert!(parsed.is_err());

    let parsed: SpecOverrides = serde_json::from_str(r#"{"type":"tar","classifier":"bin"}"#).unwrap();
    assert_eq!(parsed.kind.as_deref(), Some("tar"));
  }
}
