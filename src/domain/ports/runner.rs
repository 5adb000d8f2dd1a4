//! Runner port: the sole source of truth for pass/fail and coverage.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{RunnerRequest, RunnerResponse, TargetCoordinates};

/// Executes candidates against the code under test.
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Execute a candidate against its target.
    ///
    /// A candidate that fails, collects nothing, or times out is an `Ok`
    /// result with the matching status. `Err` is reserved for an unreachable
    /// or misbehaving service. The response carries the raw payload next to
    /// the decoded result.
    async fn execute(&self, request: &RunnerRequest) -> DomainResult<RunnerResponse>;

    /// Fetch the source of the file under test, if the service supports it.
    async fn fetch_target_source(
        &self,
        _target: &TargetCoordinates,
    ) -> DomainResult<Option<String>> {
        Ok(None)
    }
}
