//! Per-run progress state used for stagnation detection.

use serde::{Deserialize, Serialize};

/// Last observed measurements and the consecutive-no-progress counter.
///
/// Owned by a single run and threaded explicitly through
/// [`update_progress`](crate::services::progress_tracker::update_progress).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Coverage seen on the previous call.
    pub last_coverage: Option<f64>,
    /// Last available mutation score.
    pub last_mutation: Option<f64>,
    /// Consecutive iterations without progress.
    pub stagnation_count: u32,
}

impl ProgressState {
    /// State for a fresh run.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Thresholds that define "meaningful progress" between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProgressThresholds {
    /// Minimum coverage gain, in percentage points.
    #[serde(default = "default_min_coverage_gain")]
    pub min_coverage_gain: f64,

    /// Minimum mutation-score gain, in percentage points.
    #[serde(default = "default_min_mutation_gain")]
    pub min_mutation_gain: f64,

    /// Consecutive unproductive iterations before `no_progress` is raised.
    #[serde(default = "default_stagnation_limit")]
    pub stagnation_limit: u32,
}

const fn default_min_coverage_gain() -> f64 {
    1.0
}

const fn default_min_mutation_gain() -> f64 {
    2.0
}

const fn default_stagnation_limit() -> u32 {
    2
}

impl Default for ProgressThresholds {
    fn default() -> Self {
        Self {
            min_coverage_gain: default_min_coverage_gain(),
            min_mutation_gain: default_min_mutation_gain(),
            stagnation_limit: default_stagnation_limit(),
        }
    }
}
