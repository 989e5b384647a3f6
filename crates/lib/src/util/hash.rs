//! Hashing utilities for spec-addressed output paths and file identity.
//!
//! This module provides:
//! - `ObjectHash`: a SHA-256 hex digest with a short form for path segments
//! - `hash_bytes()`: arbitrary byte hashing
//! - `hash_file()`: streaming single file hashing

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters used when a hash becomes a path segment.
pub const SHORT_HASH_LEN: usize = 16;

/// A lowercase hexadecimal SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl ObjectHash {
  /// The truncated form used in directory names.
  pub fn short(&self) -> &str {
    &self.0[..SHORT_HASH_LEN.min(self.0.len())]
  }
}

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Compute the SHA-256 of a byte slice.
pub fn hash_bytes(data: &[u8]) -> ObjectHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ObjectHash(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 of a file's contents without loading it into memory.
pub fn hash_file(path: &Path) -> io::Result<ObjectHash> {
  let file = File::open(path)?;
  let mut reader = BufReader::new(file);
  let mut hasher = Sha256::new();

  let mut buffer = [0u8; 8192];
  loop {
    let bytes_read = reader.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ObjectHash(hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use tempfile::NamedTempFile;

  #[test]
  fn hash_bytes_known_value() {
    let hash = hash_bytes(b"hello world");
    assert_eq!(
      hash.0,
      "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
  }

  #[test]
  fn hash_file_matches_hash_bytes() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"hello world").unwrap();
    file.flush().unwrap();

    let hash = hash_file(file.path()).unwrap();
    assert_eq!(hash, hash_bytes(b"hello world"));
  }

  #[test]
  fn short_hash_truncates() {
    let hash = hash_bytes(b"hello world");
    assert_eq!(hash.short(), "b94d27b9934d3e08");
    assert_eq!(ObjectHash("abc".to_string()).short(), "abc");
  }
}
