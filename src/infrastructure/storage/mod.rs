//! Artifact persistence adapters.

pub mod fs_store;
pub mod memory;
pub mod run_artifacts;

pub use fs_store::FileArtifactStore;
pub use memory::InMemoryArtifactStore;
pub use run_artifacts::{AttemptArtifact, RunArtifacts};
