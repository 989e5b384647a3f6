mod artifacts;
mod classify;
mod export;
mod run;
mod tasks;

use std::path::Path;

use anyhow::{Context, Result};

use parcel_lib::BuildSession;
use parcel_lib::execute::ExecuteConfig;
use parcel_lib::project::load_session;

pub use artifacts::cmd_artifacts;
pub use classify::cmd_classify;
pub use export::cmd_export;
pub use run::cmd_run;
pub use tasks::cmd_tasks;

fn load(manifest: &Path, config: ExecuteConfig) -> Result<BuildSession> {
  load_session(manifest, config).with_context(|| format!("Failed to load manifest: {}", manifest.display()))
}
