//! Pre- and post-execution reliability scoring.
//!
//! Both functions are pure and total: missing confidence data or static
//! metrics degrade to `Unknown` or an empty lint summary, never an error.

use crate::domain::models::{
    ExecutionResult, GenerationConfidence, LintSummary, PostExecutionScore, PostLevel,
    PreExecutionScore, PreLevel, ReliabilityReason, StaticMetrics,
};

/// Entropy (bits/token) at or below which generation counts as confident.
pub const HIGH_CONFIDENCE_MAX_ENTROPY: f64 = 0.15;
/// Entropy (bits/token) at or below which generation counts as moderately confident.
pub const MEDIUM_CONFIDENCE_MAX_ENTROPY: f64 = 0.4;
/// Fraction of the coverage target that still earns "close to target".
pub const NEAR_TARGET_RATIO: f64 = 0.8;

/// Map mean token entropy onto the pre-execution scale.
pub fn entropy_level(entropy: Option<f64>) -> PreLevel {
    match entropy {
        None => PreLevel::Unknown,
        Some(e) if e.is_nan() => PreLevel::Unknown,
        Some(e) if e <= HIGH_CONFIDENCE_MAX_ENTROPY => PreLevel::High,
        Some(e) if e <= MEDIUM_CONFIDENCE_MAX_ENTROPY => PreLevel::Medium,
        Some(_) => PreLevel::Low,
    }
}

/// Estimate trust before the candidate runs.
///
/// A syntax error forces `Low`. Lint issues from available tools downgrade
/// the level by one step; unavailable tools are only mentioned in the
/// rationale.
pub fn score_pre_execution(
    confidence: Option<&GenerationConfidence>,
    static_metrics: Option<&StaticMetrics>,
) -> PreExecutionScore {
    let lint = static_metrics.map(StaticMetrics::lint_summary).unwrap_or_default();
    let (entropy, avg_logprob, token_count) = confidence
        .map(|c| (c.entropy, c.avg_logprob, c.token_count))
        .unwrap_or((None, None, 0));

    let base_level = entropy_level(entropy);
    let mut level = base_level;
    let mut rationale: Vec<String> = Vec::new();

    let syntax_ok = static_metrics.map_or(true, |m| m.syntax_ok);
    if syntax_ok {
        rationale.push(
            match (entropy.is_some(), base_level) {
                (false, _) | (true, PreLevel::Unknown) => "Entropy not available from provider.",
                (true, PreLevel::High) => "Low entropy indicates confident generation.",
                (true, PreLevel::Medium) => "Moderate entropy; some uncertainty present.",
                (true, PreLevel::Low) => "High entropy indicates uncertain generation.",
            }
            .to_string(),
        );
    } else {
        level = PreLevel::Low;
        rationale.push("Syntax errors detected in test file.".to_string());
        if let Some(err) = static_metrics
            .and_then(|m| m.syntax_error.as_deref())
            .filter(|e| !e.is_empty())
        {
            rationale.push(err.to_string());
        }
    }

    if lint.issues > 0 {
        level = level.downgrade();
        rationale.push(format!(
            "Lint/type checks surfaced {} blocking issue(s).",
            lint.issues
        ));
    } else if !lint.missing.is_empty() {
        rationale.push(format!(
            "Lint/type tools unavailable: {}.",
            lint.missing.join(", ")
        ));
    }

    PreExecutionScore {
        level,
        entropy,
        avg_logprob,
        token_count,
        rationale: rationale.join(" "),
        static_metrics: static_metrics.cloned(),
        lint,
    }
}

/// Fold the execution outcome into a final trust verdict.
///
/// Never returns [`PostLevel::Trusted`] for an unsuccessful execution.
pub fn score_post_execution(
    pre: &PreExecutionScore,
    result: &ExecutionResult,
    target_coverage: f64,
    target_mutation: f64,
) -> PostExecutionScore {
    let coverage = result.effective_coverage();
    let mutation_score = result.mutation_score;
    let mutation_available = result.mutation_available();

    let mut reasons = Vec::new();
    let level = if result.success {
        let mutation_ok =
            target_mutation <= 0.0 || !mutation_available || mutation_score >= target_mutation;
        let level = if coverage >= target_coverage && mutation_ok {
            reasons.push(ReliabilityReason::TargetsMet);
            PostLevel::Trusted
        } else if coverage >= NEAR_TARGET_RATIO * target_coverage {
            reasons.push(ReliabilityReason::CoverageNearTarget);
            PostLevel::NeedsReview
        } else {
            reasons.push(ReliabilityReason::CoverageBelowTarget);
            PostLevel::NeedsReview
        };

        if target_mutation > 0.0 {
            if !mutation_available {
                reasons.push(ReliabilityReason::MutationUnavailable);
            } else if mutation_score < target_mutation {
                reasons.push(ReliabilityReason::MutationBelowTarget);
            }
        }
        level
    } else {
        reasons.push(ReliabilityReason::ExecutionFailed);
        PostLevel::Discard
    };

    PostExecutionScore {
        pre_level: pre.level,
        level,
        reasons,
        coverage,
        target_coverage,
        mutation_score,
        target_mutation,
        success: result.success,
        test_error: result.test_error.clone(),
        lint: pre.lint.clone(),
    }
}
