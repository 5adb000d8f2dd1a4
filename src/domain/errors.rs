//! Domain errors for the covloop refinement system.
//!
//! Only infrastructure failures are errors. A candidate that fails to run,
//! collects no tests, or crashes the runner is ordinary feedback and travels
//! inside [`ExecutionResult`](super::models::ExecutionResult) instead.

use thiserror::Error;

/// Errors raised by external collaborators or the artifact layer.
///
/// Any of these aborts the current run; the controller persists a summary
/// before propagating it.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The test generator returned an error or nothing usable.
    #[error("Generation backend failed: {0}")]
    GenerationFailed(String),

    /// The enhancer backend failed outright.
    #[error("Enhancement backend failed: {0}")]
    EnhancementFailed(String),

    /// The runner could not be reached or answered with a non-2xx status.
    #[error("Runner unavailable: {0}")]
    RunnerUnavailable(String),

    /// A static analysis step failed for reasons other than a missing tool.
    #[error("Static analysis failed: {0}")]
    StaticAnalysisFailed(String),

    /// Reading or parsing the target file failed.
    #[error("Context mining failed: {0}")]
    ContextMiningFailed(String),

    /// The artifact store could not read or write.
    #[error("Artifact storage error: {0}")]
    StorageError(String),

    /// A required artifact is absent from the run's namespace.
    #[error("Artifact not found: {run_id}/{name}")]
    ArtifactNotFound { run_id: String, name: String },

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Caller-supplied data was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result alias used across ports and services.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::StorageError(err.to_string())
    }
}
