//! Artifacts: canonical specs, the in-tree artifact index and the local
//! repository layout.
//!
//! # Submodules
//!
//! - [`spec`] - `ArtifactSpec` resolution and output-path derivation
//! - [`index`] - process-wide index of artifacts produced in this build
//! - [`repo`] - mapping from specs to local repository paths

pub mod index;
pub mod repo;
pub mod spec;

pub use index::{ArtifactIndex, IndexedArtifact};
pub use repo::LocalRepository;
pub use spec::{ArtifactSpec, SpecDefaults, SpecError, SpecOverrides};
