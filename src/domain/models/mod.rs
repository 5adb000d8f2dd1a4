//! Domain models for the refinement loop.

pub mod config;
pub mod confidence;
pub mod context;
pub mod critique;
pub mod execution;
pub mod progress;
pub mod reliability;
pub mod run;
pub mod static_metrics;

pub use config::{
    ArtifactsConfig, Config, LintToolConfig, LlmConfig, LoggingConfig, RunnerConfig,
    StaticAnalysisConfig,
};
pub use confidence::{GenerationConfidence, TokenLogprob};
pub use context::ContextPack;
pub use critique::Critique;
pub use execution::{
    is_metric_available, CoverageDetails, ExecutionResult, ExecutionStatus, RunnerRequest,
    RunnerResponse, TargetCoordinates, METRIC_UNAVAILABLE,
};
pub use progress::{ProgressState, ProgressThresholds};
pub use reliability::{
    PostExecutionScore, PostLevel, PreExecutionScore, PreLevel, ReliabilityReason,
};
pub use run::{
    new_run_id, Attempt, AttemptMetrics, FinishReason, Run, RunBudget, RunSummary, RunTargets,
};
pub use static_metrics::{LintReport, LintSummary, LintToolSummary, StaticMetrics};
