//! Typed configuration sections with defaults and validation.

use serde::{Deserialize, Serialize};

use super::progress::ProgressThresholds;
use super::run::RunTargets;

/// Main configuration structure for covloop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Coverage / mutation quality bar
    #[serde(default)]
    pub targets: RunTargets,

    /// Maximum number of refinement iterations after attempt 0
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Execution service configuration
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Text-generation backend configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Static analysis configuration
    #[serde(default)]
    pub static_analysis: StaticAnalysisConfig,

    /// Stagnation thresholds
    #[serde(default)]
    pub progress: ProgressThresholds,

    /// Artifact storage configuration
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_max_iterations() -> u32 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: RunTargets::default(),
            max_iterations: default_max_iterations(),
            runner: RunnerConfig::default(),
            llm: LlmConfig::default(),
            static_analysis: StaticAnalysisConfig::default(),
            progress: ProgressThresholds::default(),
            artifacts: ArtifactsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Execution service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Endpoint that executes a candidate and reports coverage
    #[serde(default = "default_runner_url")]
    pub url: String,

    /// Endpoint that returns the target file's contents (optional)
    #[serde(default)]
    pub code_url: Option<String>,

    /// Request timeout; a timed-out execution is reported as an error result
    #[serde(default = "default_runner_timeout_secs")]
    pub timeout_secs: u64,

    /// Synthesize responses locally instead of calling the service
    #[serde(default)]
    pub dry_run: bool,
}

fn default_runner_url() -> String {
    "http://localhost:3000/runner".to_string()
}

const fn default_runner_timeout_secs() -> u64 {
    600
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            url: default_runner_url(),
            code_url: None,
            timeout_secs: default_runner_timeout_secs(),
            dry_run: false,
        }
    }
}

impl RunnerConfig {
    /// Whether responses should be synthesized locally.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run || self.url.starts_with("dryrun://")
    }
}

/// Text-generation backend configuration (OpenAI-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Use the LLM backend; falls back to the baseline generator when off
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Backend provider; only `openai` is supported.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name, also used for pricing.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the chat-completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling cutoff.
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Request token log-probabilities for confidence scoring
    #[serde(default = "default_true")]
    pub collect_logprobs: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

const fn default_temperature() -> f32 {
    0.2
}

const fn default_top_p() -> f32 {
    0.95
}

const fn default_llm_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            collect_logprobs: true,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Static analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StaticAnalysisConfig {
    /// Skip static analysis entirely when false
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lint / type-check tools run as subprocesses
    #[serde(default = "default_lint_tools")]
    pub lint_tools: Vec<LintToolConfig>,
}

impl Default for StaticAnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lint_tools: default_lint_tools(),
        }
    }
}

/// One lint/type-check tool invocation; the candidate path is appended to `args`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LintToolConfig {
    /// Key used in reports.
    pub name: String,
    /// Executable looked up on `PATH`.
    pub program: String,
    /// Arguments placed before the file path.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_lint_tools() -> Vec<LintToolConfig> {
    vec![
        LintToolConfig {
            name: "pylint".to_string(),
            program: "pylint".to_string(),
            args: vec![
                "--score=no".to_string(),
                "--disable=all".to_string(),
                "--enable=E,F".to_string(),
            ],
        },
        LintToolConfig {
            name: "mypy".to_string(),
            program: "mypy".to_string(),
            args: vec![
                "--hide-error-context".to_string(),
                "--hide-error-codes".to_string(),
            ],
        },
    ]
}

/// Artifact storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ArtifactsConfig {
    /// Directory holding one sub-directory per run
    #[serde(default = "default_artifacts_root")]
    pub root: String,
}

fn default_artifacts_root() -> String {
    "artifacts/runs".to_string()
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: default_artifacts_root(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation for file output: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
