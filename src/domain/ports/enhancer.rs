//! Enhancer port: revises a candidate using critique feedback.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ContextPack, TargetCoordinates};
use crate::domain::ports::generator::GenerationOutput;

/// Input for one refinement step.
#[derive(Debug, Clone)]
pub struct EnhanceTask {
    /// Code under test.
    pub target: TargetCoordinates,
    /// Index of the attempt being produced.
    pub attempt: u32,
    /// Candidate being revised.
    pub current_source: String,
    /// Ranked critique instructions.
    pub instructions: Vec<String>,
    /// Uncovered line numbers from the last run.
    pub uncovered_lines: Vec<u32>,
    /// Context mined before generation.
    pub context: ContextPack,
    /// Source of the file under test, when fetched.
    pub target_source: Option<String>,
}

/// Trait for candidate enhancers.
///
/// Implementations must return `current_source` unchanged when the backend
/// produces no revision.
#[async_trait]
pub trait TestEnhancer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Produce the next candidate for `task`.
    async fn enhance(&self, task: &EnhanceTask) -> DomainResult<GenerationOutput>;
}
