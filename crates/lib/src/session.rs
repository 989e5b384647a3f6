//! Build session: the context every declaration and run goes through.
//!
//! A session owns the project workspace, the task graph with its lifecycle
//! tasks, the packaging strategies, the in-tree artifact index and the run
//! ledger. Declaring a package resolves its spec, dispatches to a strategy and
//! splices the package into the owning project's lifecycle tasks:
//!
//! ```text
//! P:build <- package file <- P:package
//! P:build <- descriptor
//!            package file <- installed copy      <- P:install
//!            descriptor   <- installed descriptor <- P:install
//!            descriptor   <- P:upload  (uploads descriptor, then package)
//!                            P:uninstall (removes both installed files)
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::archive::ArchiveEntry;
use crate::artifact::{ArtifactIndex, ArtifactSpec, IndexedArtifact, LocalRepository, SpecDefaults};
use crate::consts::DEFAULT_PACKAGING;
use crate::execute::{ExecuteConfig, ExecuteError, Executor, RunLedger, RunReport};
use crate::package::{Package, PackageError, PackageRequest, PackagerRegistry};
use crate::project::{Dependency, ProjectId, ProjectOptions, Workspace};
use crate::task::{
  Action, DescriptorDoc, ExecOpts, GraphError, INTEGRATION_TASK, Lifecycle, Task, TaskGraph, file_task_name,
};

#[derive(Debug)]
pub struct BuildSession {
  workspace: Workspace,
  graph: TaskGraph,
  packagers: PackagerRegistry,
  index: ArtifactIndex,
  repository: LocalRepository,
  ledger: Arc<Mutex<RunLedger>>,
  config: ExecuteConfig,
}

impl BuildSession {
  /// Session with the process-wide lifecycle tasks and built-in strategies.
  pub fn new(repository: LocalRepository, config: ExecuteConfig) -> Result<Self, GraphError> {
    let mut graph = TaskGraph::new();
    for lifecycle in Lifecycle::ALL {
      graph.define(Task::lifecycle(lifecycle, None));
    }
    graph.define(Task::phony(INTEGRATION_TASK));

    for lifecycle in Lifecycle::ALL {
      if let Some(prerequisite) = lifecycle.prerequisite() {
        graph.depend(lifecycle.as_str(), prerequisite.as_str())?;
      }
    }
    graph.depend(INTEGRATION_TASK, Lifecycle::Package.as_str())?;
    graph.append_action(Lifecycle::Package.as_str(), Action::Integration)?;

    Ok(Self {
      workspace: Workspace::new(),
      graph,
      packagers: PackagerRegistry::new(),
      index: ArtifactIndex::new(),
      repository,
      ledger: Arc::new(Mutex::new(RunLedger::new())),
      config,
    })
  }

  /// Session configured from the environment.
  pub fn from_env() -> Result<Self, GraphError> {
    Self::new(LocalRepository::from_env(), ExecuteConfig::from_env())
  }

  pub fn workspace(&self) -> &Workspace {
    &self.workspace
  }

  pub fn workspace_mut(&mut self) -> &mut Workspace {
    &mut self.workspace
  }

  pub fn graph(&self) -> &TaskGraph {
    &self.graph
  }

  pub fn index(&self) -> &ArtifactIndex {
    &self.index
  }

  pub fn repository(&self) -> &LocalRepository {
    &self.repository
  }

  pub fn packagers(&self) -> &PackagerRegistry {
    &self.packagers
  }

  pub fn packagers_mut(&mut self) -> &mut PackagerRegistry {
    &mut self.packagers
  }

  pub fn config(&self) -> &ExecuteConfig {
    &self.config
  }

  pub fn config_mut(&mut self) -> &mut ExecuteConfig {
    &mut self.config
  }

  /// Define a project and its lifecycle tasks.
  pub fn define_project(&mut self, name: &str, options: ProjectOptions) -> Result<ProjectId, PackageError> {
    let key = self.workspace.define(name, options)?;
    let project = self.workspace.get(key);
    let name = project.name().to_string();
    let parent = project.parent().map(|p| self.workspace.get(p).name().to_string());
    let base_dir = project.base_dir().to_path_buf();
    let build = project.build_commands().to_vec();
    let integration = project.integration_commands().to_vec();

    for lifecycle in Lifecycle::ALL {
      self.graph.define(Task::lifecycle(lifecycle, Some(&name)));
    }
    for lifecycle in Lifecycle::ALL {
      let task = lifecycle.task_name(Some(&name));
      if let Some(prerequisite) = lifecycle.prerequisite() {
        self.graph.depend(&task, &prerequisite.task_name(Some(&name)))?;
      }
      self.graph.depend(&lifecycle.task_name(parent.as_deref()), &task)?;
    }

    let build_task = Lifecycle::Build.task_name(Some(&name));
    for argv in &build {
      if let Some(opts) = ExecOpts::from_argv(argv, &base_dir) {
        self.graph.append_action(&build_task, Action::Exec(opts))?;
      }
    }
    for argv in &integration {
      if let Some(opts) = ExecOpts::from_argv(argv, &base_dir) {
        self.graph.append_action(INTEGRATION_TASK, Action::Exec(opts))?;
      }
    }

    debug!(project = %name, "wired lifecycle tasks");
    Ok(key)
  }

  /// Declare a package on a project.
  ///
  /// Declaring an equivalent package again returns the existing one without
  /// wiring anything twice.
  pub fn declare_package(&mut self, key: ProjectId, request: &PackageRequest) -> Result<Arc<Package>, PackageError> {
    let project = self.workspace.get(key);
    let kind = request
      .overrides
      .kind
      .clone()
      .or_else(|| request.kind.clone())
      .or_else(|| project.packaging().map(str::to_string))
      .unwrap_or_else(|| DEFAULT_PACKAGING.to_string());

    let packager = self
      .packagers
      .get(&kind)
      .ok_or_else(|| PackageError::UnknownPackageType(kind.clone()))?;

    let group = self.workspace.group(key);
    let version = self.workspace.version(key);
    let id = project.id();
    let spec = request.overrides.resolve(SpecDefaults {
      group: &group,
      id: &id,
      version: version.as_deref(),
      kind: &kind,
    });
    let spec = packager.rewrite_spec(spec);
    let path = project.target_dir().join(spec.relative_path());

    if let Some(existing) = project.packages().iter().find(|p| p.path == path) {
      debug!(project = %project.name(), spec = %existing.spec, "package already declared");
      return Ok(Arc::clone(existing));
    }
    // One installed copy per spec: a second owner would never get installed.
    if let Some(owner) = self.index.lookup(&spec) {
      return Err(PackageError::DuplicateArtifact {
        spec,
        owner: owner.project.clone(),
      });
    }

    let project_name = project.name().to_string();
    let doc = DescriptorDoc {
      spec: spec.clone(),
      description: project.description().map(str::to_string),
      dependencies: project
        .dependencies()
        .iter()
        .filter_map(|d| match d {
          Dependency::Artifact(spec) => Some(spec.clone()),
          Dependency::File(_) => None,
        })
        .collect(),
    };

    let task_name = file_task_name(&path);
    if self.graph.contains(&task_name) {
      debug!(task = %task_name, "reusing existing package task");
    } else {
      self.graph.define(packager.materialize(project, &path));
    }
    if let Some(task) = self.graph.get_mut(&task_name) {
      task.artifact = Some(spec.clone());
    }

    let descriptor_spec = spec.descriptor();
    let descriptor = path.with_file_name(descriptor_spec.file_name());
    let descriptor_task = file_task_name(&descriptor);
    let mut task = Task::file(&descriptor, Some(&project_name)).with_action(Action::WriteDescriptor {
      path: descriptor.clone(),
      doc,
    });
    task.artifact = Some(descriptor_spec.clone());
    self.graph.define(task);

    let installed = self.repository.locate(&spec);
    let installed_descriptor = self.repository.locate(&descriptor_spec);

    self.wire_package(
      &project_name,
      &PackageNodes {
        package: &task_name,
        descriptor: &descriptor_task,
        spec: &spec,
        descriptor_spec: &descriptor_spec,
        path: &path,
        descriptor_path: &descriptor,
        installed: &installed,
        installed_descriptor: &installed_descriptor,
      },
    )?;

    let package = Arc::new(Package {
      spec: spec.clone(),
      packaging: kind,
      path: path.clone(),
      descriptor: descriptor.clone(),
      project: project_name.clone(),
      installed,
      installed_descriptor,
    });
    self.workspace.get_mut(key).push_package(Arc::clone(&package));
    self.index.register(IndexedArtifact {
      spec,
      path,
      descriptor,
      project: project_name.clone(),
    });

    info!(project = %project_name, spec = %package.spec, path = %package.path.display(), "declared package");
    Ok(package)
  }

  fn wire_package(&mut self, project: &str, nodes: &PackageNodes<'_>) -> Result<(), GraphError> {
    let graph = &mut self.graph;
    let lifecycle = |lc: Lifecycle| lc.task_name(Some(project));

    graph.depend(&lifecycle(Lifecycle::Package), nodes.package)?;
    graph.depend(nodes.package, &lifecycle(Lifecycle::Build))?;
    graph.depend(nodes.descriptor, &lifecycle(Lifecycle::Build))?;

    for (source, source_task, dest) in [
      (nodes.path, nodes.package, nodes.installed),
      (nodes.descriptor_path, nodes.descriptor, nodes.installed_descriptor),
    ] {
      let name = file_task_name(dest);
      graph.define(Task::file(dest, Some(project)).with_action(Action::Install {
        source: source.to_path_buf(),
        dest: dest.to_path_buf(),
      }));
      graph.depend(&name, source_task)?;
      graph.depend(&lifecycle(Lifecycle::Install), &name)?;
    }

    graph.append_action_once(
      &lifecycle(Lifecycle::Uninstall),
      Action::Remove {
        paths: vec![nodes.installed.to_path_buf(), nodes.installed_descriptor.to_path_buf()],
      },
    )?;

    let upload = lifecycle(Lifecycle::Upload);
    graph.depend(&upload, nodes.descriptor)?;
    let descriptor_uploaded = graph.get(&upload).is_some_and(|task| {
      task
        .actions
        .iter()
        .any(|a| matches!(a, Action::Upload { spec, .. } if spec == nodes.descriptor_spec))
    });
    if !descriptor_uploaded {
      graph.append_action(
        &upload,
        Action::Upload {
          file: nodes.descriptor_path.to_path_buf(),
          spec: nodes.descriptor_spec.clone(),
        },
      )?;
    }
    graph.append_action_once(
      &upload,
      Action::Upload {
        file: nodes.path.to_path_buf(),
        spec: nodes.spec.clone(),
      },
    )?;

    debug!(project = %project, package = %nodes.package, "wired package into lifecycle");
    Ok(())
  }

  /// Declare a package on the project called `name`.
  pub fn declare_package_named(&mut self, name: &str, request: &PackageRequest) -> Result<Arc<Package>, PackageError> {
    let key = self
      .workspace
      .find(name)
      .ok_or_else(|| PackageError::ProjectNotFound(name.to_string()))?;
    self.declare_package(key, request)
  }

  /// Append an inclusion rule to a package's archive.
  pub fn include(&mut self, package: &Package, entry: ArchiveEntry) -> Result<(), PackageError> {
    let name = package.task_name();
    let task = self
      .graph
      .get_mut(&name)
      .ok_or_else(|| GraphError::TaskNotFound(name.clone()))?;

    let entries = task.actions.iter_mut().find_map(|action| match action {
      Action::Archive { entries, .. } => Some(entries),
      _ => None,
    });
    match entries {
      Some(entries) => {
        if !entries.contains(&entry) {
          entries.push(entry);
        }
        Ok(())
      }
      None => Err(PackageError::NotIncludable(package.spec.to_string())),
    }
  }

  /// Every declared package, by project definition order.
  pub fn packages(&self) -> impl Iterator<Item = &Arc<Package>> {
    self.workspace.iter().flat_map(|p| p.packages().iter())
  }

  /// Find a declared package by spec.
  pub fn find_package(&self, spec: &ArtifactSpec) -> Option<&Arc<Package>> {
    self.packages().find(|p| &p.spec == spec)
  }

  /// Project a lifecycle task should be scoped to when invoked from `dir`.
  ///
  /// Returns `None`, meaning the process-wide task, for top-level projects and
  /// for directories outside the workspace.
  pub fn scope_for_dir(&self, dir: &Path) -> Option<String> {
    let key = self.workspace.project_containing(dir)?;
    let project = self.workspace.get(key);
    project.parent().map(|_| project.name().to_string())
  }

  /// Run a lifecycle task, process-wide or for one project.
  pub async fn run(&self, lifecycle: Lifecycle, project: Option<&str>) -> Result<RunReport, ExecuteError> {
    self.invoke(vec![lifecycle.task_name(project)]).await
  }

  /// Run arbitrary tasks by name.
  pub async fn invoke(&self, targets: Vec<String>) -> Result<RunReport, ExecuteError> {
    let executor = Executor::new(self.graph.clone(), Arc::clone(&self.ledger), self.config.clone());
    executor.run(targets).await
  }

  /// Forget which tasks completed so far.
  pub fn reset_ledger(&self) {
    self.ledger.lock().unwrap_or_else(|e| e.into_inner()).clear();
  }
}

struct PackageNodes<'a> {
  package: &'a str,
  descriptor: &'a str,
  spec: &'a ArtifactSpec,
  descriptor_spec: &'a ArtifactSpec,
  path: &'a Path,
  descriptor_path: &'a Path,
  installed: &'a Path,
  installed_descriptor: &'a Path,
}
