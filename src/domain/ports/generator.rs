//! Generator port: produces attempt 0 for a target.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ContextPack, GenerationConfidence, TargetCoordinates};

/// Everything a generator may use to synthesize the first candidate.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Code under test.
    pub target: TargetCoordinates,
    /// Mined context.
    pub context: ContextPack,
    /// Source of the file under test, when the runner could provide it.
    pub target_source: Option<String>,
}

/// A candidate plus the backend's confidence metadata, if it exposes any.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    /// Candidate test module.
    pub source: String,
    /// Backend confidence, when available.
    pub confidence: Option<GenerationConfidence>,
}

impl GenerationOutput {
    /// Output with no confidence data.
    pub fn plain(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            confidence: None,
        }
    }
}

/// Trait for initial-candidate generators.
#[async_trait]
pub trait TestGenerator: Send + Sync {
    /// Generator name (e.g., "llm", "baseline").
    fn name(&self) -> &'static str;

    /// Produce the initial candidate.
    ///
    /// Errors are infrastructure failures and abort the run.
    async fn generate(&self, request: &GenerationRequest) -> DomainResult<GenerationOutput>;
}
