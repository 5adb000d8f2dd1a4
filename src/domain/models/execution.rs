//! Runner request/response contracts.
//!
//! The runner is the sole source of truth for pass/fail, coverage and
//! mutation figures. Its payload is decoded leniently here: numeric fields may
//! arrive as numbers, numeric strings or `null`, and anything unusable falls
//! back to a conservative default instead of failing the decode.

use serde::{Deserialize, Deserializer, Serialize};

/// Reserved value marking a coverage or mutation figure as "not measured".
pub const METRIC_UNAVAILABLE: f64 = -1.0;

/// Whether a coverage/mutation figure is a real measurement.
///
/// Any negative or non-finite value is treated as the sentinel.
pub fn is_metric_available(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Identifies the code under test for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCoordinates {
    /// Repository identifier, e.g. `encode/httpx`.
    pub repo: String,
    /// Repository version or tag.
    pub version: String,
    /// Path of the file under test, relative to the repo root.
    pub code_file: String,
}

/// Payload submitted to the runner for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerRequest {
    /// Repository identifier.
    pub repo: String,
    /// Repository version or tag.
    pub version: String,
    /// File under test.
    pub code_file: String,
    /// Candidate test module source.
    pub test_src: String,
}

impl RunnerRequest {
    /// Request for `target` carrying the given candidate.
    pub fn new(target: &TargetCoordinates, test_src: impl Into<String>) -> Self {
        Self {
            repo: target.repo.clone(),
            version: target.version.clone(),
            code_file: target.code_file.clone(),
            test_src: test_src.into(),
        }
    }
}

/// Closed set of runner outcomes.
///
/// Unrecognised status strings decode as [`ExecutionStatus::Error`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Every collected test passed. The execution service reports this as `success`.
    #[serde(alias = "success")]
    Passed,
    /// Tests ran and at least one failed.
    Failed,
    /// The candidate contained nothing the test framework could collect.
    NoTestsCollected,
    /// The run itself broke, or the status was not recognised.
    #[default]
    #[serde(other)]
    Error,
}

impl ExecutionStatus {
    /// Wire label, e.g. `no_tests_collected`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::NoTestsCollected => "no_tests_collected",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line-level coverage detail reported by the runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageDetails {
    /// Statements executed by the candidate.
    #[serde(default)]
    pub covered_lines: u32,
    /// Statements in the file under test.
    #[serde(default)]
    pub num_statements: u32,
    /// Line numbers never executed.
    #[serde(default, deserialize_with = "line_numbers")]
    pub missing_lines: Vec<u32>,
    /// Line numbers excluded from measurement.
    #[serde(default, deserialize_with = "line_numbers")]
    pub excluded_lines: Vec<u32>,
}

/// Outcome of executing one candidate against the target.
///
/// Read-only input to the scoring and critique components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Outcome class.
    #[serde(default)]
    pub status: ExecutionStatus,

    /// `true` only when every collected test passed.
    #[serde(default)]
    pub success: bool,

    /// Process exit code, when the runner reports one.
    #[serde(default, alias = "exitCode")]
    pub exit_code: Option<i32>,

    /// Wall time on the runner, in seconds.
    #[serde(default, alias = "executionTime", deserialize_with = "zero_if_unusable")]
    pub execution_time: f64,

    /// Percentage in `[0, 100]`, or [`METRIC_UNAVAILABLE`].
    #[serde(default, deserialize_with = "zero_if_unusable")]
    pub coverage: f64,

    /// Percentage in `[0, 100]`, or [`METRIC_UNAVAILABLE`].
    #[serde(
        default = "unavailable",
        deserialize_with = "sentinel_if_unusable"
    )]
    pub mutation_score: f64,

    /// Per-line coverage detail.
    #[serde(default, alias = "coverageDetails")]
    pub coverage_details: CoverageDetails,

    /// Captured test output.
    #[serde(default)]
    pub stdout: String,

    /// Captured error output.
    #[serde(default)]
    pub stderr: String,

    /// Free-text error detail.
    #[serde(default)]
    pub test_error: String,
}

impl ExecutionResult {
    /// Fail-closed result used when the runner could not produce one in time.
    pub fn runner_error(detail: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Error,
            success: false,
            exit_code: None,
            execution_time: 0.0,
            coverage: 0.0,
            mutation_score: METRIC_UNAVAILABLE,
            coverage_details: CoverageDetails::default(),
            stdout: String::new(),
            stderr: String::new(),
            test_error: detail.into(),
        }
    }

    /// Coverage clamped to a usable number; the sentinel reads as zero.
    pub fn effective_coverage(&self) -> f64 {
        if is_metric_available(self.coverage) {
            self.coverage
        } else {
            0.0
        }
    }

    /// Whether `mutation_score` is a real measurement.
    pub fn mutation_available(&self) -> bool {
        is_metric_available(self.mutation_score)
    }

    /// Uncovered line numbers, possibly empty.
    pub fn missing_lines(&self) -> &[u32] {
        &self.coverage_details.missing_lines
    }
}

/// Decoded runner outcome together with the payload exactly as received.
///
/// `raw` is what gets persisted as the attempt's response artifact, so fields
/// the decoder ignores (task ids, log paths, mutant counts) survive.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerResponse {
    /// Lenient decode of `raw`.
    pub result: ExecutionResult,
    /// Untouched runner payload.
    pub raw: serde_json::Value,
}

impl RunnerResponse {
    /// Decode a runner payload, keeping the original alongside.
    pub fn from_payload(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let result = ExecutionResult::deserialize(&raw)?;
        Ok(Self { result, raw })
    }
}

impl From<ExecutionResult> for RunnerResponse {
    /// For results synthesized locally; the payload is the result itself.
    fn from(result: ExecutionResult) -> Self {
        let raw = serde_json::to_value(&result).unwrap_or_default();
        Self { result, raw }
    }
}

const fn unavailable() -> f64 {
    METRIC_UNAVAILABLE
}

fn lenient_number(value: Option<serde_json::Value>) -> Option<f64> {
    let parsed = match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn zero_if_unusable<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(lenient_number(raw).unwrap_or(0.0))
}

fn sentinel_if_unusable<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(lenient_number(raw).unwrap_or(METRIC_UNAVAILABLE))
}

/// Keeps only entries that are non-negative integers.
fn line_numbers<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_runner_payload_camel_case() {
        let payload = json!({
            "status": "failed",
            "success": false,
            "exitCode": 1,
            "executionTime": 2.5,
            "coverage": 41.2,
            "coverageDetails": {
                "covered_lines": 14,
                "num_statements": 34,
                "missing_lines": [3, 7, "x", -2, 9],
                "excluded_lines": []
            },
            "stdout": "",
            "stderr": "AssertionError",
            "repoPath": "/tmp/repo",
            "code_file": "pkg/mod.py"
        });

        let result: ExecutionResult = serde_json::from_value(payload).unwrap();
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.exit_code, Some(1));
        assert!((result.coverage - 41.2).abs() < f64::EPSILON);
        assert_eq!(result.missing_lines(), &[3, 7, 9]);
        assert!(!result.mutation_available());
        assert!((result.mutation_score - METRIC_UNAVAILABLE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_malformed_numbers_use_defaults() {
        let payload = json!({
            "status": "passed",
            "success": true,
            "coverage": "not a number",
            "mutation_score": null
        });

        let result: ExecutionResult = serde_json::from_value(payload).unwrap();
        assert!(result.coverage.abs() < f64::EPSILON);
        assert!(!result.mutation_available());
    }

    #[test]
    fn test_decode_numeric_strings() {
        let payload = json!({ "coverage": " 55.5 ", "mutation_score": "62" });
        let result: ExecutionResult = serde_json::from_value(payload).unwrap();
        assert!((result.coverage - 55.5).abs() < f64::EPSILON);
        assert!((result.mutation_score - 62.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_status_is_error() {
        let result: ExecutionResult =
            serde_json::from_value(json!({ "status": "exploded" })).unwrap();
        assert_eq!(result.status, ExecutionStatus::Error);
        assert!(!result.success);
    }

    #[test]
    fn test_effective_coverage_clamps_sentinel() {
        let mut result = ExecutionResult::runner_error("boom");
        result.coverage = METRIC_UNAVAILABLE;
        assert!(result.effective_coverage().abs() < f64::EPSILON);
        result.coverage = 12.0;
        assert!((result.effective_coverage() - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_service_payload_keeps_success_status_and_extra_fields() {
        let payload = json!({
            "status": "success",
            "success": true,
            "exitCode": -1,
            "executionTime": 0.0,
            "coverage": 80.0,
            "coverageDetails": {},
            "stdout": "collected 3 items",
            "stderr": "",
            "repoPath": "/dev/null",
            "code_file": "pkg/mod.py",
            "test_error": "",
            "task_id": "t1",
            "log_path": "/logs/t1.log",
            "mutation_score": 55.0,
            "mutation_uncertainty": 4.5,
            "mutation_num": 20
        });

        let response = RunnerResponse::from_payload(payload.clone()).unwrap();
        assert_eq!(response.result.status, ExecutionStatus::Passed);
        assert!(response.result.success);
        assert_eq!(response.result.exit_code, Some(-1));
        assert!((response.result.mutation_score - 55.0).abs() < f64::EPSILON);
        assert_eq!(response.raw, payload);
        assert_eq!(response.raw["mutation_num"], 20);
        assert_eq!(response.raw["task_id"], "t1");
    }

    #[test]
    fn test_service_error_payload() {
        let payload = json!({
            "error": "checkout failed",
            "error_type": "RuntimeError",
            "status": "error",
            "success": false,
            "coverage": -1,
            "code_file": "pkg/mod.py"
        });
        let response = RunnerResponse::from_payload(payload).unwrap();
        assert_eq!(response.result.status, ExecutionStatus::Error);
        assert!(response.result.effective_coverage().abs() < f64::EPSILON);
        assert_eq!(response.raw["error_type"], "RuntimeError");
    }

    #[test]
    fn test_synthesized_response_decodes_back_to_itself() {
        let result = ExecutionResult::runner_error("Runner timed out after 5s");
        let response = RunnerResponse::from(result.clone());
        let reloaded = RunnerResponse::from_payload(response.raw.clone()).unwrap();
        assert_eq!(reloaded.result, result);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let s = serde_json::to_string(&ExecutionStatus::NoTestsCollected).unwrap();
        assert_eq!(s, "\"no_tests_collected\"");
    }
}
