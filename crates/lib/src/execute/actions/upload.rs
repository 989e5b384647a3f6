//! Upload action.
//!
//! A directory target receives files at their repository-layout path. An HTTP
//! target receives a `PUT` per file at `<url>/<layout path>`. Nothing is
//! rolled back when a later upload fails.

use std::path::Path;

use tracing::info;

use crate::artifact::ArtifactSpec;
use crate::execute::actions::copy_atomic;
use crate::execute::types::{ActionOutcome, ExecuteError, ReleaseTarget};

pub async fn upload_file(
  file: &Path,
  spec: &ArtifactSpec,
  target: Option<&ReleaseTarget>,
) -> Result<ActionOutcome, ExecuteError> {
  let target = target.ok_or(ExecuteError::NoReleaseTarget)?;
  if !file.is_file() {
    return Err(ExecuteError::MissingFile(file.to_path_buf()));
  }

  match target {
    ReleaseTarget::Directory(root) => {
      let dest = root.join(spec.repository_path());
      copy_atomic(file, &dest).await?;
      info!(spec = %spec, dest = %dest.display(), "uploaded");
    }
    ReleaseTarget::Http {
      url,
      username,
      password,
    } => {
      let body = tokio::fs::read(file).await?;
      let target_url = format!("{url}/{}", spec.repository_segments().join("/"));
      let upload_err = |message: String| ExecuteError::UploadFailed {
        file: file.to_path_buf(),
        message,
      };

      let mut request = reqwest::Client::new().put(&target_url).body(body);
      if let Some(username) = username {
        request = request.basic_auth(username, password.as_ref());
      }

      let response = request.send().await.map_err(|e| upload_err(e.to_string()))?;
      if !response.status().is_success() {
        return Err(upload_err(format!("HTTP {}", response.status())));
      }
      info!(spec = %spec, url = %target_url, "uploaded");
    }
  }

  Ok(ActionOutcome::Performed)
}
