//! Offline runner that synthesizes responses without executing anything.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CoverageDetails, ExecutionResult, ExecutionStatus, RunnerRequest, RunnerResponse,
    METRIC_UNAVAILABLE,
};
use crate::domain::ports::TestRunner;

/// Exit code pytest uses for "no tests collected".
const NO_TESTS_EXIT_CODE: i32 = 5;

/// Runner that never contacts a service; candidates report as failed, or as
/// collecting no tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl DryRunRunner {
    /// New dry-run runner.
    pub fn new() -> Self {
        Self
    }

    fn count_tests(source: &str) -> usize {
        source
            .lines()
            .filter(|line| line.trim_start().starts_with("def test_"))
            .count()
    }
}

#[async_trait]
impl TestRunner for DryRunRunner {
    fn name(&self) -> &'static str {
        "dry_run"
    }

    async fn execute(&self, request: &RunnerRequest) -> DomainResult<RunnerResponse> {
        let test_count = Self::count_tests(&request.test_src);
        let status = if test_count == 0 {
            ExecutionStatus::NoTestsCollected
        } else {
            ExecutionStatus::Failed
        };

        Ok(ExecutionResult {
            status,
            success: false,
            exit_code: Some(NO_TESTS_EXIT_CODE),
            execution_time: 0.01,
            coverage: 0.0,
            mutation_score: METRIC_UNAVAILABLE,
            coverage_details: CoverageDetails::default(),
            stdout: String::new(),
            stderr: if test_count == 0 {
                "no tests collected".to_string()
            } else {
                String::new()
            },
            test_error: String::new(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(src: &str) -> RunnerRequest {
        RunnerRequest {
            repo: "r".into(),
            version: "v".into(),
            code_file: "m.py".into(),
            test_src: src.into(),
        }
    }

    #[tokio::test]
    async fn test_no_test_functions() {
        let result = DryRunRunner::new()
            .execute(&request("import os\n"))
            .await
            .unwrap()
            .result;
        assert_eq!(result.status, ExecutionStatus::NoTestsCollected);
        assert_eq!(result.stderr, "no tests collected");
        assert!(!result.mutation_available());
    }

    #[tokio::test]
    async fn test_with_test_functions() {
        let src = "class T:\n    def test_a(self):\n        pass\n";
        let response = DryRunRunner::new().execute(&request(src)).await.unwrap();
        assert_eq!(response.raw["status"], "failed");
        let result = response.result;
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(!result.success);
        assert!(result.coverage.abs() < f64::EPSILON);
    }
}
