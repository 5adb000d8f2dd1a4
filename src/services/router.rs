//! ENHANCE / FINISH decision for the refinement loop.

use serde::{Deserialize, Serialize};

use crate::domain::models::Critique;

/// Router output. `Finish` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Route {
    /// Request another candidate.
    Enhance,
    /// Stop the run.
    Finish,
}

impl Route {
    /// Upper-case label used in events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enhance => "ENHANCE",
            Self::Finish => "FINISH",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether to refine again.
///
/// Checks, in order: iteration budget, stagnation, then whether any defect
/// flag remains.
pub fn decide(critique: &Critique, iterations_done: u32, max_iterations: u32) -> Route {
    if iterations_done >= max_iterations {
        return Route::Finish;
    }
    if critique.no_progress {
        return Route::Finish;
    }
    if critique.needs_refinement() {
        Route::Enhance
    } else {
        Route::Finish
    }
}
