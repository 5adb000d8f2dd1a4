//! OpenAI-compatible chat-completions client.
//!
//! Works with any server exposing `/chat/completions` with the OpenAI schema.
//! When log-probabilities are requested the response's per-token data is
//! folded into a [`GenerationConfidence`] record alongside token usage and
//! the estimated cost.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::{GenerationConfidence, LlmConfig, TokenLogprob};
use crate::services::cost_tracker::estimate_cost;

/// Alternatives requested per generated token.
const TOP_LOGPROBS: u8 = 5;

/// Chat-completions client failures.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The key environment variable is unset.
    #[error("API key not set; export {0}")]
    MissingApiKey(String),

    /// Provider other than `openai`.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Transport failure.
    #[error("request failed: {0}")]
    Request(String),

    /// Non-2xx response.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body did not match the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// No choices in the response.
    #[error("response contained no choices")]
    EmptyResponse,
}

/// One completion with its confidence and usage metadata.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Completion text.
    pub text: String,
    /// Confidence and usage for this call.
    pub confidence: GenerationConfidence,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    logprobs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_logprobs: Option<u8>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    logprobs: Option<ChoiceLogprobs>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceLogprobs {
    #[serde(default)]
    content: Option<Vec<TokenEntry>>,
}

#[derive(Debug, Deserialize)]
struct TokenEntry {
    logprob: f64,
    #[serde(default)]
    top_logprobs: Vec<TopEntry>,
}

#[derive(Debug, Deserialize)]
struct TopEntry {
    logprob: f64,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Chat-completions client bound to one model configuration.
pub struct ChatCompletionClient {
    config: LlmConfig,
    api_key: String,
    client: Arc<reqwest::Client>,
}

impl ChatCompletionClient {
    /// Build a client, resolving the API key from the configured env var.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if !config.provider.eq_ignore_ascii_case("openai") {
            return Err(LlmError::UnsupportedProvider(config.provider));
        }
        let api_key = config
            .api_key()
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    /// Client with an explicit API key.
    pub fn with_api_key(config: LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            api_key: api_key.into(),
            client: Arc::new(client),
        })
    }

    /// Configured model name.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a single-message prompt and return the completion.
    pub async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            logprobs: self.config.collect_logprobs,
            top_logprobs: self.config.collect_logprobs.then_some(TOP_LOGPROBS),
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(LlmError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        let elapsed = started.elapsed();

        let usage = parsed.usage.unwrap_or_default();
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let tokens: Vec<TokenLogprob> = choice
            .logprobs
            .and_then(|lp| lp.content)
            .unwrap_or_default()
            .into_iter()
            .map(|t| TokenLogprob {
                logprob: t.logprob,
                top_logprobs: t.top_logprobs.into_iter().map(|a| a.logprob).collect(),
            })
            .collect();

        let mut confidence = GenerationConfidence::from_token_logprobs(&tokens);
        confidence.input_tokens = usage.prompt_tokens;
        confidence.output_tokens = usage.completion_tokens;
        confidence.estimated_cost =
            estimate_cost(&self.config.model, usage.prompt_tokens, usage.completion_tokens)
                .unwrap_or(0.0);
        confidence.duration_seconds = elapsed.as_secs_f64();

        tracing::debug!(
            model = %self.config.model,
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            entropy = ?confidence.entropy,
            "completion received"
        );

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            confidence,
        })
    }
}

/// Strip a surrounding markdown code fence, if the model added one.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string (e.g. `python`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```python\nimport os\n```\n"), "import os");
        assert_eq!(strip_code_fences("  def test_x(): pass  "), "def test_x(): pass");
        assert_eq!(strip_code_fences("```\nx = 1\n"), "x = 1");
    }

    #[test]
    fn test_unsupported_provider_rejected() {
        let cfg = LlmConfig {
            provider: "anthropic".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            ChatCompletionClient::new(cfg),
            Err(LlmError::UnsupportedProvider(_))
        ));
    }

    #[tokio::test]
    async fn test_completion_with_logprobs_and_usage() {
        let mut server = mockito::Server::new_async().await;
        let half = 0.5_f64.ln();
        let body = serde_json::json!({
            "choices": [{
                "message": {"content": "def test_a():\n    assert True\n"},
                "logprobs": {"content": [
                    {"token": "def", "logprob": half, "top_logprobs": [
                        {"token": "def", "logprob": half},
                        {"token": "class", "logprob": half}
                    ]}
                ]}
            }],
            "usage": {"prompt_tokens": 1000000, "completion_tokens": 0}
        });
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = ChatCompletionClient::with_api_key(config(&server.url()), "sk-test").unwrap();
        let completion = client.complete("write tests").await.unwrap();

        mock.assert_async().await;
        assert!(completion.text.starts_with("def test_a"));
        assert_eq!(completion.confidence.token_count, 1);
        assert!((completion.confidence.entropy.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(completion.confidence.input_tokens, 1_000_000);
        assert!((completion.confidence.estimated_cost - 0.15).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_logprobs_leave_entropy_unknown() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"x"}}]}"#)
            .create_async()
            .await;

        let client = ChatCompletionClient::with_api_key(config(&server.url()), "k").unwrap();
        let completion = client.complete("p").await.unwrap();
        assert!(completion.confidence.entropy.is_none());
        assert_eq!(completion.confidence.output_tokens, 0);
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = ChatCompletionClient::with_api_key(config(&server.url()), "k").unwrap();
        match client.complete("p").await {
            Err(LlmError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
