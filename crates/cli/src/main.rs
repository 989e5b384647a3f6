mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parcel_lib::consts::MANIFEST_FILENAME;
use parcel_lib::execute::ExecuteConfig;
use parcel_lib::task::Lifecycle;

use crate::output::OutputFormat;

/// parcel - package, install and release project artifacts
#[derive(Parser)]
#[command(name = "parcel")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Project manifest
  #[arg(short, long, global = true, default_value = MANIFEST_FILENAME)]
  manifest: PathBuf,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Maximum number of tasks running at once
  #[arg(short = 'j', long, global = true)]
  jobs: Option<usize>,

  /// Run integration commands after packaging
  #[arg(long, global = true)]
  integration: bool,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run build commands
  Build {
    /// Limit to one project (default: the project containing the current directory)
    #[arg(short, long)]
    project: Option<String>,
  },

  /// Build and write package archives
  Package {
    #[arg(short, long)]
    project: Option<String>,
  },

  /// Copy packages into the local repository
  Install {
    #[arg(short, long)]
    project: Option<String>,
  },

  /// Remove installed packages from the local repository
  Uninstall {
    #[arg(short, long)]
    project: Option<String>,
  },

  /// Publish packages to the release repository
  Upload {
    #[arg(short, long)]
    project: Option<String>,
  },

  /// List declared packages
  Artifacts,

  /// Show how a project's dependencies are classified
  Classify {
    #[arg(short, long)]
    project: String,
  },

  /// Write project files for external tooling
  Export {
    /// Rewrite files even when they are up to date
    #[arg(short, long)]
    force: bool,
  },

  /// List tasks and their prerequisites
  Tasks,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let level = if cli.verbose { "debug" } else { "info" };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("parcel={level},parcel_lib={level}")));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let mut config = ExecuteConfig::from_env();
  if let Some(jobs) = cli.jobs {
    config.parallelism = jobs.max(1);
  }
  config.integration |= cli.integration;

  let manifest = cli.manifest.as_path();
  let format = cli.output;
  match cli.command {
    Commands::Build { project } => cmd::cmd_run(manifest, config, Lifecycle::Build, project, format),
    Commands::Package { project } => cmd::cmd_run(manifest, config, Lifecycle::Package, project, format),
    Commands::Install { project } => cmd::cmd_run(manifest, config, Lifecycle::Install, project, format),
    Commands::Uninstall { project } => cmd::cmd_run(manifest, config, Lifecycle::Uninstall, project, format),
    Commands::Upload { project } => cmd::cmd_run(manifest, config, Lifecycle::Upload, project, format),
    Commands::Artifacts => cmd::cmd_artifacts(manifest, config, format),
    Commands::Classify { project } => cmd::cmd_classify(manifest, config, &project, format),
    Commands::Export { force } => cmd::cmd_export(manifest, config, force, format),
    Commands::Tasks => cmd::cmd_tasks(manifest, config, cli.verbose, format),
  }
}
