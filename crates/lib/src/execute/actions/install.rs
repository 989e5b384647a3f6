//! Install and uninstall actions for the local repository.
//!
//! Installation into the shared repository is serialized per destination
//! path, within this process by an async mutex and across processes by a
//! [`DestinationLock`]. A copy is skipped when the destination already has
//! the same bytes.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::execute::actions::copy_atomic_blocking;
use crate::execute::actions::lock::DestinationLock;
use crate::execute::types::{ActionOutcome, ExecuteError};
use crate::util::hash::hash_file;

/// One async lock per install destination.
#[derive(Debug, Clone, Default)]
pub struct InstallLocks {
  inner: Arc<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>>,
}

impl InstallLocks {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lock_for(&self, dest: &Path) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    locks.entry(dest.to_path_buf()).or_default().clone()
  }
}

/// Copy `source` to `dest`, creating parent directories.
pub async fn install_file(source: &Path, dest: &Path, locks: &InstallLocks) -> Result<ActionOutcome, ExecuteError> {
  if !source.is_file() {
    return Err(ExecuteError::MissingFile(source.to_path_buf()));
  }

  let lock = locks.lock_for(dest);
  let _guard = lock.lock().await;

  let (source, dest) = (source.to_path_buf(), dest.to_path_buf());
  tokio::task::spawn_blocking(move || -> Result<ActionOutcome, ExecuteError> {
    let _file_lock = DestinationLock::acquire(&dest)?;

    if dest.exists() && hash_file(&source)? == hash_file(&dest)? {
      debug!(dest = %dest.display(), "installed copy up to date");
      return Ok(ActionOutcome::UpToDate);
    }

    copy_atomic_blocking(&source, &dest)?;
    info!(source = %source.display(), dest = %dest.display(), "installed");
    Ok(ActionOutcome::Performed)
  })
  .await
  .map_err(|e| ExecuteError::Io(std::io::Error::other(e)))?
}

/// Remove `paths`. A file that is already gone counts as removed.
pub async fn remove_files(paths: &[PathBuf]) -> Result<ActionOutcome, ExecuteError> {
  let mut removed = 0;
  for path in paths {
    match tokio::fs::remove_file(path).await {
      Ok(()) => {
        info!(path = %path.display(), "removed");
        removed += 1;
      }
      Err(e) if e.kind() == ErrorKind::NotFound => {
        debug!(path = %path.display(), "already absent");
      }
      Err(e) => return Err(e.into()),
    }
  }

  Ok(if removed > 0 {
    ActionOutcome::Performed
  } else {
    ActionOutcome::UpToDate
  })
}
