//! Pure decision components of the refinement loop.

pub mod cost_tracker;
pub mod critique_builder;
pub mod progress_tracker;
pub mod reliability_scorer;
pub mod router;

pub use critique_builder::analyze;
pub use progress_tracker::update_progress;
pub use reliability_scorer::{score_post_execution, score_pre_execution};
pub use router::{decide, Route};
