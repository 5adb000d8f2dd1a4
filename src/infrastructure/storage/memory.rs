//! In-memory artifact store, mainly for tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::ports::ArtifactStore;

type RunFiles = BTreeMap<String, String>;

/// Store kept in memory, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactStore {
    runs: Arc<RwLock<BTreeMap<String, RunFiles>>>,
}

impl InMemoryArtifactStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all artifacts written for a run, sorted.
    pub async fn artifact_names(&self, run_id: &str) -> Vec<String> {
        self.runs
            .read()
            .await
            .get(run_id)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, run_id: &str, name: &str, contents: &str) -> DomainResult<()> {
        self.runs
            .write()
            .await
            .entry(run_id.to_string())
            .or_default()
            .insert(name.to_string(), contents.to_string());
        Ok(())
    }

    async fn get(&self, run_id: &str, name: &str) -> DomainResult<Option<String>> {
        Ok(self
            .runs
            .read()
            .await
            .get(run_id)
            .and_then(|files| files.get(name).cloned()))
    }

    async fn append_line(&self, run_id: &str, name: &str, line: &str) -> DomainResult<()> {
        let mut runs = self.runs.write().await;
        let file = runs
            .entry(run_id.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default();
        file.push_str(line);
        file.push('\n');
        Ok(())
    }

    async fn list_runs(&self) -> DomainResult<Vec<String>> {
        Ok(self.runs.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runs_are_isolated() {
        let store = InMemoryArtifactStore::new();
        store.put("a", "x", "1").await.unwrap();
        store.put("b", "x", "2").await.unwrap();
        assert_eq!(store.get("a", "x").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b", "x").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.list_runs().await.unwrap(), vec!["a", "b"]);
    }
}
