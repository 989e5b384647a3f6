//! Archive action.

use std::path::Path;

use tracing::{debug, info};

use crate::archive::{self, ArchiveEntry, ArchiveFormat};
use crate::execute::types::{ActionOutcome, ExecuteError};

/// Write the archive unless it was built from the same inputs and is newer
/// than everything it includes.
pub async fn execute_archive(
  output: &Path,
  format: ArchiveFormat,
  entries: &[ArchiveEntry],
) -> Result<ActionOutcome, ExecuteError> {
  let output = output.to_path_buf();
  let entries = entries.to_vec();

  tokio::task::spawn_blocking(move || -> Result<ActionOutcome, ExecuteError> {
    if archive::is_up_to_date(&output, &entries) {
      debug!(path = %output.display(), "archive up to date");
      return Ok(ActionOutcome::UpToDate);
    }

    let files = archive::write_archive(&output, format, &entries).map_err(|e| ExecuteError::Archive {
      path: output.clone(),
      message: e.to_string(),
    })?;
    info!(path = %output.display(), files, "packaged");
    Ok(ActionOutcome::Performed)
  })
  .await
  .map_err(|e| ExecuteError::Io(std::io::Error::other(e)))?
}
