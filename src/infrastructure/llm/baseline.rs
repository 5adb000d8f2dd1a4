//! Offline generator and enhancer used when no LLM backend is configured.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{
    EnhanceTask, GenerationOutput, GenerationRequest, TestEnhancer, TestGenerator,
};

/// Emits a deterministic minimal pytest module named after the first mined
/// symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineGenerator;

impl BaselineGenerator {
    /// Baseline module, with a placeholder test for `symbol` when given.
    pub fn render(symbol: Option<&str>) -> String {
        let name = symbol.map_or_else(|| "sanity".to_string(), python_identifier);
        format!("import math\n\n\ndef test_{name}_sanity():\n    x = 1 + 1\n    assert x == 2\n")
    }
}

fn python_identifier(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "sanity".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl TestGenerator for BaselineGenerator {
    fn name(&self) -> &'static str {
        "baseline"
    }

    async fn generate(&self, request: &GenerationRequest) -> DomainResult<GenerationOutput> {
        let symbol = request.context.symbols.first().map(String::as_str);
        Ok(GenerationOutput::plain(Self::render(symbol)))
    }
}

/// Returns the candidate unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEnhancer;

#[async_trait]
impl TestEnhancer for PassthroughEnhancer {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    async fn enhance(&self, task: &EnhanceTask) -> DomainResult<GenerationOutput> {
        Ok(GenerationOutput::plain(task.current_source.clone()))
    }
}
