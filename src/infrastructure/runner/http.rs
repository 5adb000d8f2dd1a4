//! HTTP runner adapter.
//!
//! POSTs the runner request as JSON and decodes the response leniently. A
//! request that times out becomes an `error` execution result; connection
//! failures and non-2xx statuses are infrastructure errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ExecutionResult, RunnerConfig, RunnerRequest, RunnerResponse, TargetCoordinates,
};
use crate::domain::ports::TestRunner;

/// Runner backed by a remote execution service.
pub struct HttpTestRunner {
    url: String,
    code_url: Option<String>,
    timeout: Duration,
    client: Arc<reqwest::Client>,
}

#[derive(Debug, Serialize)]
struct CodeFetchRequest<'a> {
    repo: &'a str,
    version: &'a str,
    code_file: &'a str,
}

#[derive(Debug, Deserialize)]
struct CodeFetchResponse {
    contents: Option<String>,
}

impl HttpTestRunner {
    /// Client for the configured runner service.
    pub fn new(config: &RunnerConfig) -> DomainResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::RunnerUnavailable(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            url: config.url.clone(),
            code_url: config.code_url.clone().filter(|u| !u.trim().is_empty()),
            timeout,
            client: Arc::new(client),
        })
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
    }

    fn timed_out(&self) -> RunnerResponse {
        ExecutionResult::runner_error(format!(
            "Runner timed out after {}s",
            self.timeout.as_secs()
        ))
        .into()
    }

    async fn ensure_success(response: reqwest::Response) -> DomainResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read response body".to_string());
        Err(DomainError::RunnerUnavailable(format!(
            "Runner returned {status}: {body}"
        )))
    }
}

#[async_trait]
impl TestRunner for HttpTestRunner {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn execute(&self, request: &RunnerRequest) -> DomainResult<RunnerResponse> {
        let response = match self.post_json(&self.url, request).await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::warn!(url = %self.url, timeout_secs = self.timeout.as_secs(), "runner request timed out");
                return Ok(self.timed_out());
            }
            Err(e) => {
                return Err(DomainError::RunnerUnavailable(format!(
                    "Runner request failed: {e}"
                )))
            }
        };

        let response = Self::ensure_success(response).await?;
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return Ok(self.timed_out()),
            Err(e) => {
                return Err(DomainError::RunnerUnavailable(format!(
                    "Failed to read runner response: {e}"
                )))
            }
        };

        serde_json::from_str::<serde_json::Value>(&body)
            .and_then(RunnerResponse::from_payload)
            .map_err(|e| {
                DomainError::SerializationError(format!("Failed to parse runner response: {e}"))
            })
    }

    async fn fetch_target_source(
        &self,
        target: &TargetCoordinates,
    ) -> DomainResult<Option<String>> {
        let Some(code_url) = &self.code_url else {
            return Ok(None);
        };

        let payload = CodeFetchRequest {
            repo: &target.repo,
            version: &target.version,
            code_file: &target.code_file,
        };
        let response = self
            .post_json(code_url, &payload)
            .await
            .map_err(|e| DomainError::RunnerUnavailable(format!("Code fetch failed: {e}")))?;
        let response = Self::ensure_success(response).await?;

        let parsed: CodeFetchResponse = response.json().await.map_err(|e| {
            DomainError::SerializationError(format!("Failed to parse code fetch response: {e}"))
        })?;

        parsed.contents.map(Some).ok_or_else(|| {
            DomainError::RunnerUnavailable(format!(
                "Code fetch response for {} has no contents",
                target.code_file
            ))
        })
    }
}
