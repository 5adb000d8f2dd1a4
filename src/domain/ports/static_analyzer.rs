//! Static analyzer port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::StaticMetrics;

/// Analyzes candidate sources before execution.
#[async_trait]
pub trait StaticAnalyzer: Send + Sync {
    /// Check syntax, compute structural metrics and run lint tools.
    ///
    /// Missing lint tools are reported as unavailable, not as errors.
    async fn analyze(&self, source: &str) -> DomainResult<StaticMetrics>;
}
