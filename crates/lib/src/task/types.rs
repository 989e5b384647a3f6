//! Task and action definitions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::archive::{ArchiveEntry, ArchiveFormat};
use crate::artifact::ArtifactSpec;
use crate::consts::PROJECT_SEPARATOR;

/// Name of the process-wide task fired by the integration hook.
pub const INTEGRATION_TASK: &str = "integration";

/// The lifecycle composition points every project carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
  Build,
  Package,
  Install,
  Uninstall,
  Upload,
}

impl Lifecycle {
  pub const ALL: [Lifecycle; 5] = [
    Lifecycle::Build,
    Lifecycle::Package,
    Lifecycle::Install,
    Lifecycle::Uninstall,
    Lifecycle::Upload,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Lifecycle::Build => "build",
      Lifecycle::Package => "package",
      Lifecycle::Install => "install",
      Lifecycle::Uninstall => "uninstall",
      Lifecycle::Upload => "upload",
    }
  }

  /// `build` for the process-wide task, `app:util:build` for a project's.
  pub fn task_name(&self, project: Option<&str>) -> String {
    match project {
      Some(project) => format!("{project}{PROJECT_SEPARATOR}{}", self.as_str()),
      None => self.as_str().to_string(),
    }
  }

  /// The lifecycle step that must complete first, if any.
  pub fn prerequisite(&self) -> Option<Lifecycle> {
    match self {
      Lifecycle::Package => Some(Lifecycle::Build),
      Lifecycle::Install | Lifecycle::Upload => Some(Lifecycle::Package),
      Lifecycle::Build | Lifecycle::Uninstall => None,
    }
  }
}

impl std::fmt::Display for Lifecycle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Lifecycle {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Lifecycle::ALL
      .into_iter()
      .find(|lc| lc.as_str() == s)
      .ok_or_else(|| format!("unknown lifecycle task '{s}'"))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
  /// A lifecycle composition point.
  Lifecycle,
  /// Produces the file it is named after.
  File,
  /// A named task with no file of its own.
  Phony,
}

/// Command run by an [`Action::Exec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOpts {
  pub bin: String,
  #[serde(default)]
  pub args: Vec<String>,
  pub cwd: PathBuf,
}

impl ExecOpts {
  /// Split an argv-style command. Returns `None` for an empty command.
  pub fn from_argv(argv: &[String], cwd: &Path) -> Option<Self> {
    let (bin, args) = argv.split_first()?;
    Some(Self {
      bin: bin.clone(),
      args: args.to_vec(),
      cwd: cwd.to_path_buf(),
    })
  }

  pub fn display(&self) -> String {
    std::iter::once(self.bin.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Contents of a companion descriptor document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorDoc {
  /// Spec of the package the descriptor describes.
  pub spec: ArtifactSpec,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub dependencies: Vec<ArtifactSpec>,
}

/// A unit of work attached to a task. A task's actions run in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
  /// Write an archive from inclusion rules.
  Archive {
    output: PathBuf,
    format: ArchiveFormat,
    entries: Vec<ArchiveEntry>,
  },
  /// Write a descriptor document.
  WriteDescriptor { path: PathBuf, doc: DescriptorDoc },
  /// Copy a file into the local repository.
  Install { source: PathBuf, dest: PathBuf },
  /// Delete files; missing files are fine.
  Remove { paths: Vec<PathBuf> },
  /// Upload a file to the release repository.
  Upload { file: PathBuf, spec: ArtifactSpec },
  /// Run a command.
  Exec(ExecOpts),
  /// Run the `integration` task inside the current run when enabled.
  Integration,
}

impl Action {
  pub fn describe(&self) -> String {
    match self {
      Action::Archive { output, format, .. } => format!("archive {format} {}", output.display()),
      Action::WriteDescriptor { path, .. } => format!("descriptor {}", path.display()),
      Action::Install { dest, .. } => format!("install {}", dest.display()),
      Action::Remove { paths } => format!("remove {} file(s)", paths.len()),
      Action::Upload { spec, .. } => format!("upload {spec}"),
      Action::Exec(opts) => format!("exec {}", opts.display()),
      Action::Integration => "integration hook".to_string(),
    }
  }
}

/// A named node in the task graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
  pub name: String,
  pub kind: TaskKind,
  /// Owning project, if any.
  #[serde(default)]
  pub project: Option<String>,
  #[serde(default)]
  pub actions: Vec<Action>,
  /// Set when the task produces a registered artifact.
  #[serde(default)]
  pub artifact: Option<ArtifactSpec>,
}

impl Task {
  pub fn lifecycle(lifecycle: Lifecycle, project: Option<&str>) -> Self {
    Self {
      name: lifecycle.task_name(project),
      kind: TaskKind::Lifecycle,
      project: project.map(str::to_string),
      actions: Vec::new(),
      artifact: None,
    }
  }

  pub fn file(path: &Path, project: Option<&str>) -> Self {
    Self {
      name: file_task_name(path),
      kind: TaskKind::File,
      project: project.map(str::to_string),
      actions: Vec::new(),
      artifact: None,
    }
  }

  pub fn phony(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: TaskKind::Phony,
      project: None,
      actions: Vec::new(),
      artifact: None,
    }
  }

  pub fn with_action(mut self, action: Action) -> Self {
    self.actions.push(action);
    self
  }
}

/// File tasks are named by their path.
pub fn file_task_name(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}
