//! Exec action: runs a build or integration command.
//!
//! Unlike store builds, project commands inherit the caller's environment and
//! run in the project base dir.

use tokio::process::Command;
use tracing::{debug, info};

use crate::execute::types::ExecuteError;
use crate::task::ExecOpts;

/// Run the command and return its trimmed stdout.
pub async fn execute_cmd(opts: &ExecOpts) -> Result<String, ExecuteError> {
  let cmd_display = opts.display();
  info!(cmd = %cmd_display, cwd = %opts.cwd.display(), "executing command");

  let output = Command::new(&opts.bin)
    .args(&opts.args)
    .current_dir(&opts.cwd)
    .output()
    .await?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    return Err(ExecuteError::CmdFailed {
      cmd: cmd_display,
      code: output.status.code(),
    });
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }
  Ok(stdout)
}
