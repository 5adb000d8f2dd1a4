//! Critique builder.
//!
//! Turns one attempt's execution result, static metrics and reliability
//! scores into flags plus a ranked instruction list for the enhancer. Rules
//! are evaluated in a fixed order and each appends at most one instruction:
//!
//! 1. syntax error
//! 2. lint issues, else missing lint tools
//! 3. runner/execution error
//! 4. no tests collected
//! 5. low coverage
//! 6. low mutation score
//! 7. remaining reliability blockers

use crate::domain::models::{
    Critique, ExecutionResult, ExecutionStatus, LintSummary, PostExecutionScore,
    PreExecutionScore, ReliabilityReason, StaticMetrics,
};

/// Uncovered lines named in a coverage instruction.
pub const MAX_LINES_IN_INSTRUCTION: usize = 10;

/// Build the critique for one attempt.
///
/// Pure and total. Deltas and `no_progress` are left at their defaults for
/// [`update_progress`](super::progress_tracker::update_progress) to fill in.
pub fn analyze(
    result: &ExecutionResult,
    static_metrics: Option<&StaticMetrics>,
    pre: &PreExecutionScore,
    post: &PostExecutionScore,
    target_coverage: f64,
    target_mutation: f64,
) -> Critique {
    let target_coverage = finite_or_zero(target_coverage);
    let target_mutation = finite_or_zero(target_mutation);
    let coverage = result.effective_coverage();
    let mutation_available = result.mutation_available();

    let syntax_error = static_metrics
        .filter(|m| !m.syntax_ok)
        .map(|m| m.syntax_error.clone().unwrap_or_default());
    let lint: LintSummary = static_metrics.map_or_else(|| pre.lint.clone(), StaticMetrics::lint_summary);

    let runtime_error = !result.success && result.status == ExecutionStatus::Error;
    let compile_error = runtime_error || syntax_error.is_some();
    let no_tests = result.status == ExecutionStatus::NoTestsCollected;
    let low_coverage = target_coverage > 0.0 && coverage < target_coverage;
    let low_mutation =
        target_mutation > 0.0 && (!mutation_available || result.mutation_score < target_mutation);

    let mut instructions = Vec::new();

    // 1. syntax
    if let Some(err) = &syntax_error {
        instructions.push(if err.is_empty() {
            "Fix syntax errors reported by the parser.".to_string()
        } else {
            format!("Fix syntax errors reported by the parser: {err}")
        });
    }

    // 2. lint
    if lint.issues > 0 {
        instructions.push(format!(
            "Resolve {} lint/type-check issue(s) reported by static analysis.",
            lint.issues
        ));
    } else if !lint.missing.is_empty() {
        instructions.push(format!(
            "Static analysis incomplete; install missing tools: {}.",
            lint.missing.join(", ")
        ));
    }

    // 3. execution failure with valid syntax
    if compile_error && syntax_error.is_none() {
        instructions.push("Resolve runner errors and ensure tests execute successfully.".to_string());
    }

    // 4. collection
    if no_tests {
        instructions.push("Add at least one test function so tests are collected.".to_string());
    }

    // 5. coverage
    if low_coverage {
        let missing = result.missing_lines();
        if missing.is_empty() {
            instructions.push("Increase test coverage with more assertions.".to_string());
        } else {
            let lines: Vec<String> = missing
                .iter()
                .take(MAX_LINES_IN_INSTRUCTION)
                .map(u32::to_string)
                .collect();
            instructions.push(format!("Add coverage for lines: {}.", lines.join(", ")));
        }
    }

    // 6. mutation
    if low_mutation {
        instructions.push(if mutation_available {
            format!(
                "Strengthen assertions to raise mutation score from {:.1} to at least {:.1}.",
                result.mutation_score, target_mutation
            )
        } else {
            format!(
                "Mutation score unavailable; treat the {target_mutation:.1} mutation target as unmet and add assertions that would kill mutants."
            )
        });
    }

    // 7. reliability blockers not already addressed
    let blockers: Vec<&str> = post
        .reasons
        .iter()
        .filter(|r| r.is_blocker() && !covered_by_flags(**r, compile_error, no_tests, low_coverage, low_mutation))
        .map(|r| r.message())
        .collect();
    for message in blockers {
        instructions.push(format!("Reliability blocker: {message}"));
    }

    Critique {
        compile_error,
        no_tests,
        low_coverage,
        low_mutation,
        mutation_score: result.mutation_score,
        lint_issue_count: lint.issues,
        lint_missing_tools: lint.missing,
        coverage_delta: 0.0,
        mutation_delta: 0.0,
        no_progress: false,
        missing_lines: result.missing_lines().to_vec(),
        instructions,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Whether an earlier rule already produced an instruction for this reason.
fn covered_by_flags(
    reason: ReliabilityReason,
    compile_error: bool,
    no_tests: bool,
    low_coverage: bool,
    low_mutation: bool,
) -> bool {
    match reason {
        ReliabilityReason::ExecutionFailed => compile_error || no_tests,
        ReliabilityReason::CoverageNearTarget | ReliabilityReason::CoverageBelowTarget => {
            low_coverage
        }
        ReliabilityReason::MutationUnavailable | ReliabilityReason::MutationBelowTarget => {
            low_mutation
        }
        ReliabilityReason::TargetsMet => true,
    }
}
