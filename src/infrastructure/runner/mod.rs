//! Runner adapters.

pub mod dry_run;
pub mod http;

use std::sync::Arc;

pub use dry_run::DryRunRunner;
pub use http::HttpTestRunner;

use crate::domain::errors::DomainResult;
use crate::domain::models::RunnerConfig;
use crate::domain::ports::TestRunner;

/// Pick the runner for a configuration.
pub fn build_runner(config: &RunnerConfig) -> DomainResult<Arc<dyn TestRunner>> {
    if config.is_dry_run() {
        Ok(Arc::new(DryRunRunner::new()))
    } else {
        Ok(Arc::new(HttpTestRunner::new(config)?))
    }
}
