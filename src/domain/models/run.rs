//! Run and attempt records.
//!
//! A [`Run`] is one optimization session for a single target. Its attempts
//! form an append-only log; each [`Attempt`] is complete (and never mutated)
//! once the controller has scored, critiqued and persisted it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::confidence::GenerationConfidence;
use super::critique::Critique;
use super::execution::{ExecutionResult, RunnerRequest, TargetCoordinates};
use super::progress::ProgressState;
use super::reliability::{PostExecutionScore, PreExecutionScore};
use super::static_metrics::StaticMetrics;

/// Build a unique run identifier: `run_<unix_millis>_<8 hex chars>`.
pub fn new_run_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("run_{}_{}", Utc::now().timestamp_millis(), &simple[..8])
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Quality bar for a run. A mutation target of zero disables mutation gating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunTargets {
    /// Coverage target in percent; zero disables it.
    #[serde(default = "default_target_coverage")]
    pub coverage: f64,
    /// Mutation target in percent; zero disables it.
    #[serde(default)]
    pub mutation: f64,
}

const fn default_target_coverage() -> f64 {
    60.0
}

impl Default for RunTargets {
    fn default() -> Self {
        Self {
            coverage: default_target_coverage(),
            mutation: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Attempt
// ---------------------------------------------------------------------------

/// Timing and LLM usage for one attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptMetrics {
    /// Attempt index.
    pub attempt: u32,
    /// Enhancer wall time; `None` for the initial generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhancer_duration_seconds: Option<f64>,
    /// Runner wall time.
    pub runner_duration_seconds: f64,
    /// Static analysis wall time; zero when analysis is disabled.
    pub static_analysis_duration_seconds: f64,
    /// Backend-reported generation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_duration_seconds: Option<f64>,
    /// Estimated generation cost in USD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_cost: Option<f64>,
    /// Prompt tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_input_tokens: Option<u64>,
    /// Completion tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_output_tokens: Option<u64>,
}

impl AttemptMetrics {
    /// Copy usage figures from the backend's confidence record.
    pub fn with_llm_usage(mut self, confidence: Option<&GenerationConfidence>) -> Self {
        if let Some(conf) = confidence {
            self.llm_duration_seconds = Some(conf.duration_seconds);
            self.llm_cost = Some(conf.estimated_cost);
            self.llm_input_tokens = Some(conf.input_tokens);
            self.llm_output_tokens = Some(conf.output_tokens);
        }
        self
    }
}

/// One iteration's candidate plus everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// 0-based; attempt 0 comes from the generator, the rest from the enhancer.
    pub index: u32,
    /// Candidate source that was executed.
    pub source: String,
    /// Payload sent to the runner.
    pub request: RunnerRequest,
    /// Backend confidence, when reported.
    pub confidence: Option<GenerationConfidence>,
    /// Static analysis output, when enabled.
    pub static_metrics: Option<StaticMetrics>,
    /// Score computed before execution.
    pub pre_reliability: PreExecutionScore,
    /// Decoded runner outcome.
    pub response: ExecutionResult,
    /// Verdict computed after execution.
    pub post_reliability: PostExecutionScore,
    /// Critique fed to the router and enhancer.
    pub critique: Critique,
    /// Timing and usage for this attempt.
    pub metrics: AttemptMetrics,
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

/// Cumulative cost, token and duration counters for a run.
///
/// Counters only ever increase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunBudget {
    /// Estimated cost in USD.
    pub llm_cost: f64,
    /// Prompt tokens.
    pub llm_input_tokens: u64,
    /// Completion tokens.
    pub llm_output_tokens: u64,
    /// Generation and enhancement wall time.
    pub generation: Duration,
    /// Runner wall time.
    pub execution: Duration,
    /// Static analysis wall time.
    pub static_analysis: Duration,
}

impl RunBudget {
    /// Record one generation/enhancement call.
    pub fn record_generation(
        &mut self,
        elapsed: Duration,
        confidence: Option<&GenerationConfidence>,
    ) {
        self.generation += elapsed;
        if let Some(conf) = confidence {
            self.llm_cost += conf.estimated_cost.max(0.0);
            self.llm_input_tokens += conf.input_tokens;
            self.llm_output_tokens += conf.output_tokens;
        }
    }

    /// Record one runner call.
    pub fn record_execution(&mut self, elapsed: Duration) {
        self.execution += elapsed;
    }

    /// Record one static analysis pass.
    pub fn record_static_analysis(&mut self, elapsed: Duration) {
        self.static_analysis += elapsed;
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Coverage reached the target (fast exit).
    CoverageMet,
    /// Router judged the candidate to satisfy every target.
    RouterFinish,
    /// Iteration budget exhausted.
    BudgetExhausted,
    /// Consecutive iterations without meaningful improvement.
    NoProgress,
    /// A collaborator failed and the run was abandoned.
    Aborted,
}

impl FinishReason {
    /// Snake-case label written to summaries and events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CoverageMet => "coverage_met",
            Self::RouterFinish => "router_finish",
            Self::BudgetExhausted => "budget_exhausted",
            Self::NoProgress => "no_progress",
            Self::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-level summary artifact, written on every exit path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identifier.
    pub run_id: String,
    /// Code under test.
    pub target: TargetCoordinates,
    /// Exit path taken.
    pub finish_reason: FinishReason,
    /// Attempts actually evaluated.
    pub iterations: u32,
    /// Wall time from start to summary.
    pub total_duration_seconds: f64,
    /// Estimated generation cost in USD.
    pub total_llm_cost: f64,
    /// Prompt tokens across all calls.
    pub total_llm_input_tokens: u64,
    /// Completion tokens across all calls.
    pub total_llm_output_tokens: u64,
    /// Generation and enhancement wall time.
    pub total_llm_duration_seconds: f64,
    /// Runner wall time.
    pub total_runner_duration_seconds: f64,
    /// Static analysis wall time.
    pub total_static_analysis_duration_seconds: f64,
    /// Coverage of the last evaluated attempt.
    pub final_coverage: Option<f64>,
    /// Mutation score of the last evaluated attempt.
    pub final_mutation_score: Option<f64>,
    /// Error message when the run aborted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Summary write time.
    pub finished_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// One end-to-end optimization session, owned by a single controller.
#[derive(Debug, Clone)]
pub struct Run {
    /// Run identifier, `run_<unix_millis>_<8 hex>`.
    pub id: String,
    /// Code under test.
    pub target: TargetCoordinates,
    /// Enhancement budget.
    pub max_iterations: u32,
    /// Coverage and mutation targets.
    pub targets: RunTargets,
    /// Accumulated cost and durations.
    pub budget: RunBudget,
    /// Stagnation state threaded through the progress tracker.
    pub progress: ProgressState,
    /// Evaluated attempts, in order.
    pub attempts: Vec<Attempt>,
    /// Run start.
    pub started_at: DateTime<Utc>,
}

impl Run {
    /// Fresh run with a new id and empty counters.
    pub fn new(target: TargetCoordinates, max_iterations: u32, targets: RunTargets) -> Self {
        Self {
            id: new_run_id(),
            target,
            max_iterations,
            targets,
            budget: RunBudget::default(),
            progress: ProgressState::new(),
            attempts: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Most recently evaluated attempt.
    pub fn last_attempt(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    /// Freeze the counters into a summary.
    pub fn summarize(&self, finish_reason: FinishReason, error: Option<String>) -> RunSummary {
        let finished_at = Utc::now();
        let elapsed = (finished_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let last = self.last_attempt();

        RunSummary {
            run_id: self.id.clone(),
            target: self.target.clone(),
            finish_reason,
            iterations: u32::try_from(self.attempts.len()).unwrap_or(u32::MAX),
            total_duration_seconds: elapsed.as_secs_f64(),
            total_llm_cost: self.budget.llm_cost,
            total_llm_input_tokens: self.budget.llm_input_tokens,
            total_llm_output_tokens: self.budget.llm_output_tokens,
            total_llm_duration_seconds: self.budget.generation.as_secs_f64(),
            total_runner_duration_seconds: self.budget.execution.as_secs_f64(),
            total_static_analysis_duration_seconds: self.budget.static_analysis.as_secs_f64(),
            final_coverage: last.map(|a| a.response.effective_coverage()),
            final_mutation_score: last
                .filter(|a| a.response.mutation_available())
                .map(|a| a.response.mutation_score),
            error,
            started_at: self.started_at,
            finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_shape() {
        let id = new_run_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "run");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(new_run_id(), new_run_id());
    }

    #[test]
    fn test_budget_accumulates_monotonically() {
        let mut budget = RunBudget::default();
        let conf = GenerationConfidence {
            input_tokens: 100,
            output_tokens: 40,
            estimated_cost: 0.002,
            ..GenerationConfidence::default()
        };

        budget.record_generation(Duration::from_millis(1500), Some(&conf));
        budget.record_generation(Duration::from_millis(500), None);
        budget.record_execution(Duration::from_secs(3));
        budget.record_static_analysis(Duration::from_millis(250));

        assert_eq!(budget.llm_input_tokens, 100);
        assert_eq!(budget.llm_output_tokens, 40);
        assert!((budget.llm_cost - 0.002).abs() < 1e-12);
        assert_eq!(budget.generation, Duration::from_secs(2));
        assert_eq!(budget.execution, Duration::from_secs(3));
        assert_eq!(budget.static_analysis, Duration::from_millis(250));
    }

    #[test]
    fn test_budget_ignores_negative_cost() {
        let mut budget = RunBudget::default();
        let conf = GenerationConfidence { estimated_cost: -4.0, ..GenerationConfidence::default() };
        budget.record_generation(Duration::ZERO, Some(&conf));
        assert!(budget.llm_cost.abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_of_empty_run() {
        let run = Run::new(
            TargetCoordinates {
                repo: "psf/requests".into(),
                version: "2.31".into(),
                code_file: "requests/utils.py".into(),
            },
            2,
            RunTargets::default(),
        );
        let summary = run.summarize(FinishReason::Aborted, Some("backend down".into()));
        assert_eq!(summary.iterations, 0);
        assert_eq!(summary.final_coverage, None);
        assert_eq!(summary.finish_reason, FinishReason::Aborted);
        assert_eq!(summary.error.as_deref(), Some("backend down"));
    }

    #[test]
    fn test_metrics_with_llm_usage() {
        let conf = GenerationConfidence {
            input_tokens: 12,
            output_tokens: 7,
            estimated_cost: 0.5,
            duration_seconds: 1.25,
            ..GenerationConfidence::default()
        };
        let metrics = AttemptMetrics { attempt: 1, ..AttemptMetrics::default() }
            .with_llm_usage(Some(&conf));
        assert_eq!(metrics.llm_input_tokens, Some(12));
        assert_eq!(metrics.llm_duration_seconds, Some(1.25));

        let json = serde_json::to_value(AttemptMetrics::default()).unwrap();
        assert!(json.get("llm_cost").is_none());
    }
}
