//! Action handlers.
//!
//! Every handler is idempotent: running it against an already satisfied
//! output reports [`ActionOutcome::UpToDate`] instead of redoing the work.

pub mod archive;
pub mod cmd;
pub mod descriptor;
pub mod install;
pub mod lock;
pub mod upload;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::execute::types::{ActionOutcome, ExecuteConfig, ExecuteError};
use crate::task::Action;

pub use archive::execute_archive;
pub use cmd::execute_cmd;
pub use descriptor::{render_descriptor, write_descriptor};
pub use install::{InstallLocks, install_file, remove_files};
pub use upload::upload_file;

/// Execute a single action.
///
/// [`Action::Integration`] needs the running executor and is handled there;
/// it is a no-op here.
pub async fn execute_action(
  action: &Action,
  config: &ExecuteConfig,
  locks: &InstallLocks,
) -> Result<ActionOutcome, ExecuteError> {
  match action {
    Action::Archive {
      output,
      format,
      entries,
    } => execute_archive(output, *format, entries).await,
    Action::WriteDescriptor { path, doc } => write_descriptor(path, doc).await,
    Action::Install { source, dest } => install_file(source, dest, locks).await,
    Action::Remove { paths } => remove_files(paths).await,
    Action::Upload { file, spec } => upload_file(file, spec, config.release.as_ref()).await,
    Action::Exec(opts) => execute_cmd(opts).await.map(|_| ActionOutcome::Performed),
    Action::Integration => Ok(ActionOutcome::UpToDate),
  }
}

/// Fill a sibling temp file and move it over `path`, creating parent
/// directories. Concurrent writers never share a temp file.
fn persist_with(path: &Path, fill: impl FnOnce(&mut File) -> io::Result<()>) -> io::Result<()> {
  let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
  fs::create_dir_all(parent)?;

  let mut temp = NamedTempFile::new_in(parent)?;
  fill(temp.as_file_mut())?;
  temp.persist(path).map_err(|e| e.error)?;
  Ok(())
}

pub(crate) fn write_atomic_blocking(path: &Path, data: &[u8]) -> io::Result<()> {
  persist_with(path, |file| {
    file.write_all(data)?;
    readable_by_all(file)
  })
}

pub(crate) fn copy_atomic_blocking(source: &Path, dest: &Path) -> io::Result<()> {
  let permissions = fs::metadata(source)?.permissions();
  persist_with(dest, |file| {
    io::copy(&mut File::open(source)?, file)?;
    file.set_permissions(permissions)
  })
}

/// Temp files start out private to the owner.
#[cfg(unix)]
fn readable_by_all(file: &File) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn readable_by_all(_file: &File) -> io::Result<()> {
  Ok(())
}

async fn blocking<T, F>(f: F) -> Result<T, ExecuteError>
where
  F: FnOnce() -> io::Result<T> + Send + 'static,
  T: Send + 'static,
{
  let result = tokio::task::spawn_blocking(f)
    .await
    .map_err(|e| ExecuteError::Io(io::Error::other(e)))?;
  Ok(result?)
}

/// Write `data` to `path` atomically, creating parent directories.
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), ExecuteError> {
  let (path, data) = (path.to_path_buf(), data.to_vec());
  blocking(move || write_atomic_blocking(&path, &data)).await
}

/// Copy `source` to `dest` atomically, creating parent directories.
pub(crate) async fn copy_atomic(source: &Path, dest: &Path) -> Result<(), ExecuteError> {
  let (source, dest) = (source.to_path_buf(), dest.to_path_buf());
  blocking(move || copy_atomic_blocking(&source, &dest)).await
}
