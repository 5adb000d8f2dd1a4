//! Stagnation detection across iterations of one run.

use crate::domain::models::{is_metric_available, Critique, ProgressState, ProgressThresholds};

/// Annotate `critique` with deltas and `no_progress`, advancing `state`.
///
/// Deltas are taken against the last observed values and are zero on the
/// first measurement. The stagnation counter grows only while the critique
/// is still below a target and neither gain threshold was reached; any other
/// iteration resets it.
pub fn update_progress(
    mut critique: Critique,
    coverage: f64,
    mutation_score: f64,
    state: &mut ProgressState,
    thresholds: &ProgressThresholds,
) -> Critique {
    let coverage_delta = coverage - state.last_coverage.unwrap_or(coverage);

    let mutation_available = is_metric_available(mutation_score);
    let mutation_delta = if mutation_available {
        mutation_score - state.last_mutation.unwrap_or(mutation_score)
    } else {
        0.0
    };

    let progress_made = coverage_delta >= thresholds.min_coverage_gain
        || mutation_delta >= thresholds.min_mutation_gain;

    if !progress_made && critique.below_targets() {
        state.stagnation_count += 1;
    } else {
        state.stagnation_count = 0;
    }

    critique.coverage_delta = coverage_delta;
    critique.mutation_delta = mutation_delta;
    critique.no_progress = state.stagnation_count >= thresholds.stagnation_limit;

    state.last_coverage = Some(coverage);
    if mutation_available {
        state.last_mutation = Some(mutation_score);
    }

    critique
}
