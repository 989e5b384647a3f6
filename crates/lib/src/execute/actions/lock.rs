//! File locks guarding writes into the shared local repository.
//!
//! Every destination gets a sibling `.<name>.lock` file. Holding an exclusive
//! lock on it serializes writers across processes; the lock is released when
//! the guard is dropped.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

pub struct DestinationLock {
  _file: File,
  lock_path: PathBuf,
}

impl DestinationLock {
  /// Block until the lock for `dest` is held, creating parent directories.
  pub fn acquire(dest: &Path) -> io::Result<Self> {
    let lock_path = lock_path(dest);
    if let Some(parent) = lock_path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)?;
    lock_exclusive(&file)?;

    trace!(lock = %lock_path.display(), "acquired destination lock");
    Ok(DestinationLock { _file: file, lock_path })
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

pub fn lock_path(dest: &Path) -> PathBuf {
  let name = dest
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  dest.with_file_name(format!(".{name}.lock"))
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::LockExclusive).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn lock_exclusive(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(handle, LOCKFILE_EXCLUSIVE_LOCK, 0, 1, 0, &mut overlapped)
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
