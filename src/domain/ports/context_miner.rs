//! Context miner port.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ContextPack;

/// Extracts context from the file under test.
#[async_trait]
pub trait ContextMiner: Send + Sync {
    /// Best-effort extraction of symbols and docstrings.
    ///
    /// A missing or unreadable target yields an empty pack.
    async fn mine(&self, target_path: &Path) -> DomainResult<ContextPack>;
}
