//! Generation backends.
//!
//! The LLM pair is selected when the backend is enabled and its API key is
//! set; otherwise the offline baseline pair is used.

pub mod baseline;
pub mod client;
pub mod generator;
pub mod prompt;

use std::sync::Arc;

use crate::domain::models::LlmConfig;
use crate::domain::ports::{TestEnhancer, TestGenerator};

pub use baseline::{BaselineGenerator, PassthroughEnhancer};
pub use client::{ChatCompletionClient, Completion, LlmError};
pub use generator::{LlmTestEnhancer, LlmTestGenerator};
pub use prompt::TestFramework;

fn llm_client(config: &LlmConfig) -> Option<ChatCompletionClient> {
    if !config.enabled {
        return None;
    }
    match ChatCompletionClient::new(config.clone()) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "LLM backend unavailable; using baseline");
            None
        }
    }
}

/// Generator for `config`, falling back to the baseline when the backend is unavailable.
pub fn build_generator(config: &LlmConfig) -> Arc<dyn TestGenerator> {
    match llm_client(config) {
        Some(client) => Arc::new(LlmTestGenerator::new(client)),
        None => Arc::new(BaselineGenerator),
    }
}

/// Enhancer for `config`, falling back to a pass-through when the backend is unavailable.
pub fn build_enhancer(config: &LlmConfig) -> Arc<dyn TestEnhancer> {
    match llm_client(config) {
        Some(client) => Arc::new(LlmTestEnhancer::new(client)),
        None => Arc::new(PassthroughEnhancer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_backend_selects_baseline() {
        let config = LlmConfig {
            enabled: false,
            ..LlmConfig::default()
        };
        assert_eq!(build_generator(&config).name(), "baseline");
        assert_eq!(build_enhancer(&config).name(), "passthrough");
    }

    #[test]
    fn test_missing_key_selects_baseline() {
        let config = LlmConfig {
            api_key_env: "COVLOOP_TEST_UNSET_KEY".to_string(),
            ..LlmConfig::default()
        };
        temp_env::with_var_unset("COVLOOP_TEST_UNSET_KEY", || {
            assert_eq!(build_generator(&config).name(), "baseline");
        });
    }
}
