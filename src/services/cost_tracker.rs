//! Model-aware cost estimation for the generation backend.

/// Pricing per million tokens for a specific model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Cost per million input tokens (USD).
    pub input: f64,
    /// Cost per million output tokens (USD).
    pub output: f64,
}

/// Known model pricing table (costs in USD per million tokens).
const PRICING_TABLE: &[(&str, ModelPricing)] = &[
    ("gpt-3.5-turbo-0125", ModelPricing { input: 0.5, output: 1.5 }),
    ("gpt-4-turbo-2024-04-09", ModelPricing { input: 10.0, output: 30.0 }),
    ("gpt-4o-2024-05-13", ModelPricing { input: 5.0, output: 15.0 }),
    ("gpt-4o-mini", ModelPricing { input: 0.15, output: 0.60 }),
    ("gpt-4o", ModelPricing { input: 2.50, output: 10.0 }),
    ("gpt-4-0613", ModelPricing { input: 10.0, output: 30.0 }),
    ("gpt-4", ModelPricing { input: 10.0, output: 30.0 }),
    ("Meta-Llama-3.1-405B-Instruct", ModelPricing { input: 0.0, output: 0.0 }),
];

/// Get pricing for a model by exact name.
pub fn get_model_pricing(model: &str) -> Option<ModelPricing> {
    PRICING_TABLE
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, pricing)| *pricing)
}

/// Estimate cost in USD for a given set of token counts.
///
/// Returns `None` for models missing from the pricing table.
pub fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
    let pricing = get_model_pricing(model)?;

    let cost = (input_tokens as f64 * pricing.input + output_tokens as f64 * pricing.output)
        / 1_000_000.0;

    Some(cost)
}
