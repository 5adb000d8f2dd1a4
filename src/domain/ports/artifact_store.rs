//! Artifact store port: append-only, namespaced by run id.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Trait for run artifact storage.
///
/// Every artifact lives under a run namespace; runs never share one.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write (or replace) a named artifact.
    async fn put(&self, run_id: &str, name: &str, contents: &str) -> DomainResult<()>;

    /// Read a named artifact, `None` if it was never written.
    async fn get(&self, run_id: &str, name: &str) -> DomainResult<Option<String>>;

    /// Append one line to a named artifact, creating it if needed.
    async fn append_line(&self, run_id: &str, name: &str, line: &str) -> DomainResult<()>;

    /// Identifiers of all runs with at least one artifact, sorted.
    async fn list_runs(&self) -> DomainResult<Vec<String>>;
}
