//! LLM-backed generator and enhancer.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{
    EnhanceTask, GenerationOutput, GenerationRequest, TestEnhancer, TestGenerator,
};
use crate::infrastructure::llm::client::{strip_code_fences, ChatCompletionClient};
use crate::infrastructure::llm::prompt::{enhancement_prompt, generation_prompt};

/// Produces the first candidate of a run from the chat-completions backend.
pub struct LlmTestGenerator {
    client: ChatCompletionClient,
}

impl LlmTestGenerator {
    /// Generator backed by `client`.
    pub fn new(client: ChatCompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TestGenerator for LlmTestGenerator {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn generate(&self, request: &GenerationRequest) -> DomainResult<GenerationOutput> {
        let prompt = generation_prompt(request);
        let completion = self
            .client
            .complete(&prompt)
            .await
            .map_err(|e| DomainError::GenerationFailed(e.to_string()))?;

        let source = strip_code_fences(&completion.text);
        if source.is_empty() {
            return Err(DomainError::GenerationFailed(format!(
                "{} returned an empty candidate",
                self.client.model()
            )));
        }

        Ok(GenerationOutput {
            source,
            confidence: Some(completion.confidence),
        })
    }
}

/// Revises candidates from critique instructions.
///
/// An empty revision keeps the current source; usage is still reported.
pub struct LlmTestEnhancer {
    client: ChatCompletionClient,
}

impl LlmTestEnhancer {
    /// Enhancer backed by `client`.
    pub fn new(client: ChatCompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TestEnhancer for LlmTestEnhancer {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn enhance(&self, task: &EnhanceTask) -> DomainResult<GenerationOutput> {
        let prompt = enhancement_prompt(task);
        let completion = self
            .client
            .complete(&prompt)
            .await
            .map_err(|e| DomainError::EnhancementFailed(e.to_string()))?;

        let revised = strip_code_fences(&completion.text);
        let source = if revised.is_empty() {
            tracing::warn!(attempt = task.attempt, "empty revision; keeping current source");
            task.current_source.clone()
        } else {
            revised
        };

        Ok(GenerationOutput {
            source,
            confidence: Some(completion.confidence),
        })
    }
}
