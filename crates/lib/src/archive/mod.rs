//! Archive writer for package files.
//!
//! An archive is composed from an ordered list of [`ArchiveEntry`] inclusion
//! rules. A directory source contributes its files recursively, a file source
//! contributes itself, and a `merge` source (an existing zip) contributes its
//! entries. Names are unique inside an archive: the first rule to claim a name
//! wins and later claims are dropped.
//!
//! Archives are written through a sibling temp file and only replace the
//! output once complete. A stamp file next to the archive records the
//! fingerprint of the rules and files it was built from.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::util::hash::{ObjectHash, hash_bytes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
  Zip,
  Tar,
  TarGz,
}

impl std::fmt::Display for ArchiveFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ArchiveFormat::Zip => write!(f, "zip"),
      ArchiveFormat::Tar => write!(f, "tar"),
      ArchiveFormat::TarGz => write!(f, "tgz"),
    }
  }
}

/// One inclusion rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveEntry {
  /// File or directory on disk.
  pub source: PathBuf,
  /// Directory prefix inside the archive; empty for the archive root.
  #[serde(default)]
  pub dest: String,
  /// Treat `source` as a zip whose entries are merged into the archive.
  #[serde(default)]
  pub merge: bool,
}

impl ArchiveEntry {
  pub fn new(source: impl Into<PathBuf>) -> Self {
    Self {
      source: source.into(),
      dest: String::new(),
      merge: false,
    }
  }

  pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
    self.dest = dest.into();
    self
  }

  pub fn merged(mut self) -> Self {
    self.merge = true;
    self
  }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("io error: {0}")]
  Io(#[from] io::Error),

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("failed to walk {path}: {message}")]
  Walk { path: PathBuf, message: String },

  #[error("failed to fingerprint archive inputs: {0}")]
  Fingerprint(#[from] serde_json::Error),
}

/// Write `output` from `entries`, returning the number of files stored.
///
/// `output` is left untouched when writing fails.
pub fn write_archive(output: &Path, format: ArchiveFormat, entries: &[ArchiveEntry]) -> Result<usize, ArchiveError> {
  let parent = output.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
  fs::create_dir_all(parent)?;
  let stamp = fingerprint(entries)?;

  let mut temp = NamedTempFile::new_in(parent)?;
  let count = match format {
    ArchiveFormat::Zip => write_zip(temp.as_file_mut(), entries)?,
    ArchiveFormat::Tar => {
      let mut builder = tar::Builder::new(temp.as_file_mut());
      let count = append_tar(&mut builder, entries)?;
      builder.into_inner()?.flush()?;
      count
    }
    ArchiveFormat::TarGz => {
      let encoder = flate2::write::GzEncoder::new(temp.as_file_mut(), flate2::Compression::default());
      let mut builder = tar::Builder::new(encoder);
      let count = append_tar(&mut builder, entries)?;
      builder.into_inner()?.finish()?;
      count
    }
  };
  // Temp files start out private to the owner.
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    temp.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
  }
  temp.persist(output).map_err(|e| e.error)?;
  fs::write(stamp_path(output), stamp.0.as_bytes())?;

  debug!(output = %output.display(), format = %format, files = count, "archive written");
  Ok(count)
}

/// List the file names stored in an archive.
pub fn list_entries(path: &Path, format: ArchiveFormat) -> Result<Vec<String>, ArchiveError> {
  match format {
    ArchiveFormat::Zip => {
      let mut archive = ZipArchive::new(File::open(path)?)?;
      let mut names = Vec::with_capacity(archive.len());
      for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if !entry.is_dir() {
          names.push(entry.name().to_owned());
        }
      }
      Ok(names)
    }
    ArchiveFormat::Tar => list_tar(tar::Archive::new(File::open(path)?)),
    ArchiveFormat::TarGz => list_tar(tar::Archive::new(flate2::read::GzDecoder::new(File::open(path)?))),
  }
}

/// Path of the stamp recording what `output` was built from.
pub fn stamp_path(output: &Path) -> PathBuf {
  let name = output
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  output.with_file_name(format!(".{name}.stamp"))
}

/// Hash of the inclusion rules together with the files they currently cover.
pub fn fingerprint(entries: &[ArchiveEntry]) -> Result<ObjectHash, ArchiveError> {
  let files: Vec<PathBuf> = entries.iter().flat_map(source_files).collect();
  let encoded = serde_json::to_vec(&(entries, &files))?;
  Ok(hash_bytes(&encoded))
}

/// Whether `output` was built from the current rules and files and is newer
/// than every file the entries include.
pub fn is_up_to_date(output: &Path, entries: &[ArchiveEntry]) -> bool {
  let Some(built) = modified(output) else {
    return false;
  };
  let Ok(recorded) = fs::read_to_string(stamp_path(output)) else {
    return false;
  };
  match fingerprint(entries) {
    Ok(current) if current.0 == recorded.trim() => {}
    _ => return false,
  }

  entries
    .iter()
    .flat_map(source_files)
    .all(|file| modified(&file).is_some_and(|time| time <= built))
}

fn modified(path: &Path) -> Option<SystemTime> {
  fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Files on disk an entry reads from, in walk order.
fn source_files(entry: &ArchiveEntry) -> Vec<PathBuf> {
  if !entry.source.exists() {
    return Vec::new();
  }
  WalkDir::new(&entry.source)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .map(|e| e.into_path())
    .collect()
}

/// Expand a non-merge entry into `(archive name, file)` pairs.
fn expand(entry: &ArchiveEntry) -> Result<Vec<(String, PathBuf)>, ArchiveError> {
  let source = &entry.source;
  if !source.exists() {
    warn!(source = %source.display(), "archive source does not exist, skipping");
    return Ok(Vec::new());
  }

  if source.is_file() {
    let name = source
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_default();
    return Ok(vec![(archive_name(&entry.dest, &name), source.clone())]);
  }

  let mut files = Vec::new();
  for item in WalkDir::new(source).sort_by_file_name() {
    let item = item.map_err(|e| ArchiveError::Walk {
      path: source.clone(),
      message: e.to_string(),
    })?;
    if !item.file_type().is_file() {
      continue;
    }
    let relative = item.path().strip_prefix(source).unwrap_or(item.path());
    let relative = relative
      .iter()
      .map(|c| c.to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");
    files.push((archive_name(&entry.dest, &relative), item.path().to_path_buf()));
  }
  Ok(files)
}

fn archive_name(dest: &str, name: &str) -> String {
  let dest = dest.trim_matches('/');
  if dest.is_empty() {
    name.to_string()
  } else {
    format!("{dest}/{name}")
  }
}

fn write_zip<W: Write + io::Seek>(out: W, entries: &[ArchiveEntry]) -> Result<usize, ArchiveError> {
  let mut zip = ZipWriter::new(out);
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
  let mut seen = HashSet::new();

  for entry in entries {
    if entry.merge {
      merge_zip_into_zip(&mut zip, entry, &mut seen, options)?;
      continue;
    }
    for (name, path) in expand(entry)? {
      if !seen.insert(name.clone()) {
        debug!(name = %name, "duplicate archive entry, keeping first");
        continue;
      }
      zip.start_file(name, options)?;
      let mut file = File::open(&path)?;
      io::copy(&mut file, &mut zip)?;
    }
  }

  zip.finish()?;
  Ok(seen.len())
}

fn merge_zip_into_zip<W: Write + io::Seek>(
  zip: &mut ZipWriter<W>,
  entry: &ArchiveEntry,
  seen: &mut HashSet<String>,
  options: SimpleFileOptions,
) -> Result<(), ArchiveError> {
  if !entry.source.is_file() {
    warn!(source = %entry.source.display(), "merge source is not a file, skipping");
    return Ok(());
  }

  let mut archive = ZipArchive::new(File::open(&entry.source)?)?;
  for i in 0..archive.len() {
    let mut file = archive.by_index(i)?;
    if file.is_dir() {
      continue;
    }
    let name = archive_name(&entry.dest, file.name());
    if !seen.insert(name.clone()) {
      debug!(name = %name, "merged entry already present, keeping first");
      continue;
    }
    zip.start_file(name, options)?;
    io::copy(&mut file, zip)?;
  }
  Ok(())
}

fn append_tar<W: Write>(builder: &mut tar::Builder<W>, entries: &[ArchiveEntry]) -> Result<usize, ArchiveError> {
  let mut seen = HashSet::new();

  for entry in entries {
    if entry.merge {
      if !entry.source.is_file() {
        warn!(source = %entry.source.display(), "merge source is not a file, skipping");
        continue;
      }
      let mut archive = ZipArchive::new(File::open(&entry.source)?)?;
      for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
          continue;
        }
        let name = archive_name(&entry.dest, file.name());
        if !seen.insert(name.clone()) {
          continue;
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, &name, data.as_slice())?;
      }
      continue;
    }

    for (name, path) in expand(entry)? {
      if !seen.insert(name.clone()) {
        debug!(name = %name, "duplicate archive entry, keeping first");
        continue;
      }
      builder.append_path_with_name(&path, &name)?;
    }
  }

  Ok(seen.len())
}

fn list_tar<R: Read>(mut archive: tar::Archive<R>) -> Result<Vec<String>, ArchiveError> {
  let mut names = Vec::new();
  for entry in archive.entries()? {
    let entry = entry?;
    if entry.header().entry_type().is_file() {
      names.push(entry.path()?.to_string_lossy().into_owned());
    }
  }
  Ok(names)
}
