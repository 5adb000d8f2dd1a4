//! Structured critique of one attempt.

use serde::{Deserialize, Serialize};

/// Flags, deltas and ranked refinement instructions for one attempt.
///
/// Every flag has a documented trigger in the critique builder; the deltas and
/// `no_progress` are filled in afterwards by the progress tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    /// Runner error, or the candidate does not parse.
    pub compile_error: bool,
    /// The runner collected no tests.
    pub no_tests: bool,
    /// Coverage is below a non-zero target.
    pub low_coverage: bool,
    /// Mutation score is below a non-zero target, or unavailable.
    pub low_mutation: bool,
    /// Mutation score as reported; may be the unavailable sentinel.
    pub mutation_score: f64,
    /// Issues reported by available lint tools.
    pub lint_issue_count: u32,
    /// Lint tools that could not be run.
    pub lint_missing_tools: Vec<String>,
    /// Coverage change since the previous attempt, in percentage points.
    pub coverage_delta: f64,
    /// Mutation change since the previous attempt, in percentage points.
    pub mutation_delta: f64,
    /// Set once stagnation reaches the configured limit.
    pub no_progress: bool,
    /// Uncovered line numbers from the runner.
    pub missing_lines: Vec<u32>,
    /// Ordered by priority of the rule that appended them.
    pub instructions: Vec<String>,
}

impl Critique {
    /// Whether any defect flag asks for another refinement.
    pub fn needs_refinement(&self) -> bool {
        self.compile_error || self.no_tests || self.low_coverage || self.low_mutation
    }

    /// Whether coverage or mutation is still short of its target.
    pub fn below_targets(&self) -> bool {
        self.low_coverage || self.low_mutation
    }
}
