//! Reliability (trust) verdicts attached to each attempt.
//!
//! A pre-execution score is computed before the candidate ever runs, from
//! generation confidence and static analysis. The post-execution score folds
//! in the actual execution outcome and always dominates the final trust
//! decision.

use serde::{Deserialize, Serialize};

use super::static_metrics::{LintSummary, StaticMetrics};

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// Pre-execution confidence, ordered `High > Medium > Low`, plus `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreLevel {
    /// Entropy at or below 0.15 bits per token.
    High,
    /// Entropy at or below 0.4 bits per token.
    Medium,
    /// High entropy, a syntax error, or a lint downgrade.
    Low,
    /// No entropy data.
    Unknown,
}

impl PreLevel {
    /// One step down the `high > medium > low` scale, floored at `Low`.
    ///
    /// `Unknown` is not on the scale and degrades straight to `Low`.
    pub fn downgrade(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium | Self::Low | Self::Unknown => Self::Low,
        }
    }

    /// Lower-case label used in artifacts and tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PreLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post-execution trust verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostLevel {
    /// Executed cleanly and met every active target.
    Trusted,
    /// Executed cleanly but short of a target.
    NeedsReview,
    /// Did not execute successfully.
    Discard,
}

impl PostLevel {
    /// Lower-case label used in artifacts and tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trusted => "trusted",
            Self::NeedsReview => "needs_review",
            Self::Discard => "discard",
        }
    }
}

impl std::fmt::Display for PostLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Reasons
// ---------------------------------------------------------------------------

/// Why a post-execution verdict was reached, in the order it was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityReason {
    /// The candidate did not execute successfully.
    ExecutionFailed,
    /// Coverage and mutation targets are met.
    TargetsMet,
    /// Coverage is within 80% of the target.
    CoverageNearTarget,
    /// Coverage is further below the target.
    CoverageBelowTarget,
    /// A mutation target is set but no score was measured.
    MutationUnavailable,
    /// Mutation score is below its target.
    MutationBelowTarget,
}

impl ReliabilityReason {
    /// Human-readable explanation.
    pub fn message(self) -> &'static str {
        match self {
            Self::ExecutionFailed => "Tests failed to execute successfully.",
            Self::TargetsMet => "Coverage and mutation targets met.",
            Self::CoverageNearTarget => "Coverage close to target; review before trust.",
            Self::CoverageBelowTarget => "Coverage below target threshold.",
            Self::MutationUnavailable => "Mutation score unavailable; rerun mutation testing.",
            Self::MutationBelowTarget => "Mutation score below target.",
        }
    }

    /// Whether this reason blocks trust (as opposed to confirming it).
    pub fn is_blocker(self) -> bool {
        !matches!(self, Self::TargetsMet)
    }
}

impl std::fmt::Display for ReliabilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Trust estimate produced before execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreExecutionScore {
    /// Confidence level after syntax and lint adjustments.
    pub level: PreLevel,
    /// Mean entropy in bits per token, when known.
    pub entropy: Option<f64>,
    /// Mean chosen-token log-probability, when known.
    pub avg_logprob: Option<f64>,
    /// Tokens that carried log-probabilities.
    pub token_count: u32,
    /// Why the level was chosen.
    pub rationale: String,
    /// Static-analysis payload, verbatim.
    #[serde(rename = "static")]
    pub static_metrics: Option<StaticMetrics>,
    /// Lint totals and missing tools.
    pub lint: LintSummary,
}

/// Trust verdict produced after execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostExecutionScore {
    /// The pre-execution level, kept for display.
    pub pre_level: PreLevel,
    /// Final verdict.
    pub level: PostLevel,
    /// Reasons in the order they were found.
    pub reasons: Vec<ReliabilityReason>,
    /// Measured coverage.
    pub coverage: f64,
    /// Coverage target used for the verdict.
    pub target_coverage: f64,
    /// Measured mutation score, or the sentinel.
    pub mutation_score: f64,
    /// Mutation target; zero disables it.
    pub target_mutation: f64,
    /// Runner success flag.
    pub success: bool,
    /// Runner error detail.
    pub test_error: String,
    /// Lint totals carried over from the pre-score.
    pub lint: LintSummary,
}
