//! Test helpers for running shell snippets as build commands.

use std::path::Path;

use crate::task::{Action, ExecOpts};

/// Argv running `script` through the platform shell.
#[cfg(unix)]
pub fn shell_argv(script: &str) -> Vec<String> {
  vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

#[cfg(windows)]
pub fn shell_argv(script: &str) -> Vec<String> {
  vec!["cmd.exe".to_string(), "/C".to_string(), script.to_string()]
}

/// Command options running `script` in `cwd`.
pub fn shell(script: &str, cwd: &Path) -> ExecOpts {
  let mut argv = shell_argv(script);
  let bin = argv.remove(0);
  ExecOpts {
    bin,
    args: argv,
    cwd: cwd.to_path_buf(),
  }
}

pub fn shell_action(script: &str, cwd: &Path) -> Action {
  Action::Exec(shell(script, cwd))
}
