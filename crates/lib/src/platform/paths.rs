//! Default locations and environment overrides.
//!
//! Every location can be redirected through an environment variable so that
//! tests and CI runs stay isolated from the user's real repository.

use std::path::PathBuf;

use crate::consts::APP_NAME;

/// Overrides the local repository root.
pub const LOCAL_REPO_ENV: &str = "PARCEL_LOCAL_REPO";
/// Upload target: a directory, a `file://` URL or an `http(s)://` URL.
pub const RELEASE_REPO_ENV: &str = "PARCEL_RELEASE_REPO";
pub const RELEASE_USERNAME_ENV: &str = "PARCEL_RELEASE_USERNAME";
pub const RELEASE_PASSWORD_ENV: &str = "PARCEL_RELEASE_PASSWORD";
/// Enables the integration hook on the process-wide `package` task.
pub const INTEGRATION_ENV: &str = "PARCEL_INTEGRATION";

/// Returns the user's home directory, falling back to the current directory.
pub fn home_dir() -> PathBuf {
  dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the root of the local repository used for installs.
pub fn local_repo_dir() -> PathBuf {
  if let Ok(path) = std::env::var(LOCAL_REPO_ENV)
    && !path.is_empty()
  {
    return PathBuf::from(path);
  }

  default_local_repo_dir()
}

pub fn default_local_repo_dir() -> PathBuf {
  home_dir().join(format!(".{APP_NAME}")).join("repository")
}

/// Returns the configured release repository, if any.
pub fn release_repo() -> Option<String> {
  std::env::var(RELEASE_REPO_ENV).ok().filter(|s| !s.is_empty())
}

/// Returns basic-auth credentials for the release repository.
pub fn release_credentials() -> Option<(String, Option<String>)> {
  let username = std::env::var(RELEASE_USERNAME_ENV).ok().filter(|s| !s.is_empty())?;
  let password = std::env::var(RELEASE_PASSWORD_ENV).ok().filter(|s| !s.is_empty());
  Some((username, password))
}

/// Whether the integration hook was requested through the environment.
pub fn integration_enabled() -> bool {
  std::env::var(INTEGRATION_ENV)
    .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
    .unwrap_or(false)
}
