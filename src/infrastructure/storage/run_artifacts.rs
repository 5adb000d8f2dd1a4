//! Typed view over one run's artifact namespace.
//!
//! Per attempt `k` the run directory holds `attempt_k.request.json`,
//! `attempt_k.test_src.py`, `attempt_k.llm_metadata.json` (when the backend
//! reported confidence), `attempt_k.static.json` (when static analysis ran),
//! `attempt_k.pre_reliability.json`, `attempt_k.response.json` (the runner
//! payload as received), `attempt_k.post_reliability.json`,
//! `attempt_k.critique.json` and `attempt_k.metrics.json`. Run-level files are `context.json`,
//! `target_code.py`, `events.log` and `run_summary.json`.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Attempt, AttemptMetrics, ContextPack, Critique, GenerationConfidence, PostExecutionScore,
    PreExecutionScore, RunSummary, RunnerRequest, RunnerResponse, StaticMetrics,
};
use crate::domain::ports::ArtifactStore;

/// Mined context.
pub const CONTEXT: &str = "context.json";
/// Source of the file under test.
pub const TARGET_CODE: &str = "target_code.py";
/// Event log, one line per evaluated attempt.
pub const EVENTS_LOG: &str = "events.log";
/// Final run summary.
pub const RUN_SUMMARY: &str = "run_summary.json";

/// Per-attempt artifact kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptArtifact {
    /// `attempt_k.request.json`
    Request,
    /// `attempt_k.py`
    Source,
    /// `attempt_k.llm_metadata.json`
    LlmMetadata,
    /// `attempt_k.static.json`
    Static,
    /// `attempt_k.pre_reliability.json`
    PreReliability,
    /// `attempt_k.response.json`
    Response,
    /// `attempt_k.post_reliability.json`
    PostReliability,
    /// `attempt_k.critique.json`
    Critique,
    /// `attempt_k.metrics.json`
    Metrics,
}

impl AttemptArtifact {
    fn suffix(self) -> &'static str {
        match self {
            Self::Request => "request.json",
            Self::Source => "test_src.py",
            Self::LlmMetadata => "llm_metadata.json",
            Self::Static => "static.json",
            Self::PreReliability => "pre_reliability.json",
            Self::Response => "response.json",
            Self::PostReliability => "post_reliability.json",
            Self::Critique => "critique.json",
            Self::Metrics => "metrics.json",
        }
    }

    /// File name for attempt `index`, e.g. `attempt_2.critique.json`.
    pub fn file_name(self, index: u32) -> String {
        format!("attempt_{index}.{}", self.suffix())
    }
}

/// Artifact access bound to a single run id.
#[derive(Clone)]
pub struct RunArtifacts {
    store: Arc<dyn ArtifactStore>,
    run_id: String,
}

impl RunArtifacts {
    /// View of `run_id` in `store`.
    pub fn new(store: Arc<dyn ArtifactStore>, run_id: impl Into<String>) -> Self {
        Self {
            store,
            run_id: run_id.into(),
        }
    }

    /// Run identifier.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Write a run-level JSON artifact.
    pub async fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> DomainResult<()> {
        let body = serde_json::to_string_pretty(value)?;
        self.store.put(&self.run_id, name, &body).await
    }

    /// Write a run-level text artifact.
    pub async fn write_text(&self, name: &str, text: &str) -> DomainResult<()> {
        self.store.put(&self.run_id, name, text).await
    }

    /// Write a per-attempt JSON artifact.
    pub async fn write_attempt_json<T: Serialize + ?Sized>(
        &self,
        index: u32,
        kind: AttemptArtifact,
        value: &T,
    ) -> DomainResult<()> {
        self.write_json(&kind.file_name(index), value).await
    }

    /// Write the candidate source for attempt `index`.
    pub async fn write_attempt_source(&self, index: u32, source: &str) -> DomainResult<()> {
        self.write_text(&AttemptArtifact::Source.file_name(index), source)
            .await
    }

    /// Append `t=<millis> run=<id> <detail>` to the run's event log.
    pub async fn event(&self, detail: &str) -> DomainResult<()> {
        let line = format!(
            "t={} run={} {detail}",
            Utc::now().timestamp_millis(),
            self.run_id
        );
        self.store.append_line(&self.run_id, EVENTS_LOG, &line).await
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Read a run-level JSON artifact, `None` when absent.
    pub async fn read_json<T: DeserializeOwned>(&self, name: &str) -> DomainResult<Option<T>> {
        match self.store.get(&self.run_id, name).await? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn require_json<T: DeserializeOwned>(&self, name: &str) -> DomainResult<T> {
        self.read_json(name)
            .await?
            .ok_or_else(|| self.not_found(name))
    }

    fn not_found(&self, name: &str) -> DomainError {
        DomainError::ArtifactNotFound {
            run_id: self.run_id.clone(),
            name: name.to_string(),
        }
    }

    /// Mined context, when stored.
    pub async fn read_context(&self) -> DomainResult<Option<ContextPack>> {
        self.read_json(CONTEXT).await
    }

    /// Final summary; absent until the run finishes.
    pub async fn read_summary(&self) -> DomainResult<RunSummary> {
        self.require_json(RUN_SUMMARY).await
    }

    /// Event log lines.
    pub async fn read_events(&self) -> DomainResult<Vec<String>> {
        Ok(self
            .store
            .get(&self.run_id, EVENTS_LOG)
            .await?
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Reassemble attempt `index` from its persisted parts.
    ///
    /// Optional parts (LLM metadata, static metrics) come back as `None` when
    /// absent; every other part is required.
    pub async fn load_attempt(&self, index: u32) -> DomainResult<Attempt> {
        let request: RunnerRequest = self
            .require_json(&AttemptArtifact::Request.file_name(index))
            .await?;
        let source_name = AttemptArtifact::Source.file_name(index);
        let source = self
            .store
            .get(&self.run_id, &source_name)
            .await?
            .unwrap_or_else(|| request.test_src.clone());

        let confidence: Option<GenerationConfidence> = self
            .read_json(&AttemptArtifact::LlmMetadata.file_name(index))
            .await?;
        let static_metrics: Option<StaticMetrics> = self
            .read_json(&AttemptArtifact::Static.file_name(index))
            .await?;
        let pre_reliability: PreExecutionScore = self
            .require_json(&AttemptArtifact::PreReliability.file_name(index))
            .await?;
        let raw_response: serde_json::Value = self
            .require_json(&AttemptArtifact::Response.file_name(index))
            .await?;
        let response = RunnerResponse::from_payload(raw_response)?.result;
        let post_reliability: PostExecutionScore = self
            .require_json(&AttemptArtifact::PostReliability.file_name(index))
            .await?;
        let critique: Critique = self
            .require_json(&AttemptArtifact::Critique.file_name(index))
            .await?;
        let metrics: AttemptMetrics = self
            .require_json(&AttemptArtifact::Metrics.file_name(index))
            .await?;

        Ok(Attempt {
            index,
            source,
            request,
            confidence,
            static_metrics,
            pre_reliability,
            response,
            post_reliability,
            critique,
            metrics,
        })
    }

    /// Load every fully persisted attempt, stopping at the first gap.
    pub async fn load_attempts(&self) -> DomainResult<Vec<Attempt>> {
        let mut attempts = Vec::new();
        for index in 0.. {
            match self.load_attempt(index).await {
                Ok(attempt) => attempts.push(attempt),
                Err(DomainError::ArtifactNotFound { .. }) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryArtifactStore;

    #[test]
    fn test_attempt_file_names() {
        assert_eq!(AttemptArtifact::Request.file_name(0), "attempt_0.request.json");
        assert_eq!(AttemptArtifact::Source.file_name(3), "attempt_3.test_src.py");
        assert_eq!(
            AttemptArtifact::PostReliability.file_name(1),
            "attempt_1.post_reliability.json"
        );
    }

    #[tokio::test]
    async fn test_event_line_format() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let artifacts = RunArtifacts::new(store, "run_5_deadbeef");
        artifacts.event("attempt=0 state=RUN").await.unwrap();
        artifacts.event("finish reason=coverage_met").await.unwrap();

        let events = artifacts.read_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].starts_with("t="));
        assert!(events[0].ends_with("run=run_5_deadbeef attempt=0 state=RUN"));
        assert!(events[1].ends_with("finish reason=coverage_met"));
    }

    #[tokio::test]
    async fn test_missing_attempt_is_not_found() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let artifacts = RunArtifacts::new(store, "run_1_00000000");
        let err = artifacts.load_attempt(0).await.unwrap_err();
        assert!(matches!(err, DomainError::ArtifactNotFound { .. }));
        assert!(artifacts.load_attempts().await.unwrap().is_empty());
    }
}
