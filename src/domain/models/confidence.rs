//! Generation-confidence metadata reported by the text-generation backend.

use serde::{Deserialize, Serialize};

/// Token-level uncertainty and usage for one generation or enhancement call.
///
/// `entropy` and `avg_logprob` are `None` when the backend does not expose
/// log-probabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfidence {
    /// Mean Shannon entropy, in bits per generated token.
    pub entropy: Option<f64>,
    /// Mean log-probability of the chosen tokens.
    pub avg_logprob: Option<f64>,
    /// Number of tokens that carried log-probabilities.
    #[serde(default)]
    pub token_count: u32,
    /// Prompt tokens.
    #[serde(default)]
    pub input_tokens: u64,
    /// Completion tokens.
    #[serde(default)]
    pub output_tokens: u64,
    /// Estimated cost in USD.
    #[serde(default)]
    pub estimated_cost: f64,
    /// Wall time of the backend call.
    #[serde(default, rename = "llm_duration_seconds")]
    pub duration_seconds: f64,
}

/// Per-token log-probabilities as returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLogprob {
    /// Log-probability of the sampled token.
    pub logprob: f64,
    /// Log-probabilities of the top alternatives, sampled token included.
    pub top_logprobs: Vec<f64>,
}

impl GenerationConfidence {
    /// Derive entropy and mean log-probability from per-token data.
    ///
    /// Entropy is computed over the top-k alternatives renormalised to sum to
    /// one. Tokens without alternatives fall back to the single sampled
    /// probability, which contributes zero entropy.
    pub fn from_token_logprobs(tokens: &[TokenLogprob]) -> Self {
        if tokens.is_empty() {
            return Self::default();
        }

        let mut entropy_sum = 0.0;
        let mut logprob_sum = 0.0;
        for token in tokens {
            logprob_sum += token.logprob;
            entropy_sum += token_entropy_bits(token);
        }
        let n = tokens.len() as f64;

        Self {
            entropy: Some(entropy_sum / n),
            avg_logprob: Some(logprob_sum / n),
            token_count: u32::try_from(tokens.len()).unwrap_or(u32::MAX),
            ..Self::default()
        }
    }
}

fn token_entropy_bits(token: &TokenLogprob) -> f64 {
    let probs: Vec<f64> = if token.top_logprobs.is_empty() {
        vec![token.logprob.exp()]
    } else {
        token.top_logprobs.iter().map(|lp| lp.exp()).collect()
    };
    let total: f64 = probs.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    probs
        .iter()
        .map(|p| p / total)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certain_tokens_have_zero_entropy() {
        let tokens = vec![
            TokenLogprob { logprob: 0.0, top_logprobs: vec![0.0] },
            TokenLogprob { logprob: 0.0, top_logprobs: vec![] },
        ];
        let conf = GenerationConfidence::from_token_logprobs(&tokens);
        assert_eq!(conf.token_count, 2);
        assert!(conf.entropy.unwrap().abs() < 1e-12);
        assert!(conf.avg_logprob.unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_coin_flip_token_is_one_bit() {
        let half = 0.5_f64.ln();
        let tokens = vec![TokenLogprob { logprob: half, top_logprobs: vec![half, half] }];
        let conf = GenerationConfidence::from_token_logprobs(&tokens);
        assert!((conf.entropy.unwrap() - 1.0).abs() < 1e-9);
        assert!((conf.avg_logprob.unwrap() - half).abs() < 1e-12);
    }

    #[test]
    fn test_empty_tokens_yield_unknown_confidence() {
        let conf = GenerationConfidence::from_token_logprobs(&[]);
        assert!(conf.entropy.is_none());
        assert!(conf.avg_logprob.is_none());
        assert_eq!(conf.token_count, 0);
    }
}
