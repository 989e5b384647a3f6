//! parcel-lib: packaging engine for parcel.
//!
//! The crate turns declared projects and packages into a task graph and runs
//! it:
//! - `project`: the project hierarchy and the `parcel.toml` manifest
//! - `session`: package declaration and lifecycle wiring
//! - `task` / `execute`: the task graph and its wave executor
//! - `archive`: zip and tar writers behind every built-in package type
//! - `classify` / `export`: dependency classification for external tooling

pub mod archive;
pub mod artifact;
pub mod classify;
pub mod consts;
pub mod execute;
pub mod export;
pub mod package;
pub mod platform;
pub mod project;
pub mod session;
pub mod task;
pub mod util;

pub use session::BuildSession;
