use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for Adaptest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Directory holding the pattern, rule, and run-history stores
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Where generated tests are written
    #[serde(default = "default_generated_tests_dir")]
    pub generated_tests_dir: String,

    /// Where predictive tests are written
    #[serde(default = "default_predictive_tests_dir")]
    pub predictive_tests_dir: String,

    /// Failure learning configuration
    #[serde(default)]
    pub learning: LearningConfig,

    /// Run-history analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Test synthesizer collaborator configuration
    #[serde(default)]
    pub synthesizer: SynthesizerConfig,

    /// External test runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> String {
    ".adaptest".to_string()
}

fn default_generated_tests_dir() -> String {
    "ai_generated_tests".to_string()
}

fn default_predictive_tests_dir() -> String {
    "predictive_tests".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            generated_tests_dir: default_generated_tests_dir(),
            predictive_tests_dir: default_predictive_tests_dir(),
            learning: LearningConfig::default(),
            analytics: AnalyticsConfig::default(),
            synthesizer: SynthesizerConfig::default(),
            runner: RunnerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn patterns_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("failure_patterns.json")
    }

    pub fn rules_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("adaptive_rules.json")
    }

    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("test_history.json")
    }
}

/// Failure learning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LearningConfig {
    /// Minimum pattern frequency before a pattern contributes to a rule
    #[serde(default = "default_min_pattern_frequency")]
    pub min_pattern_frequency: u32,

    /// Minimum confidence for a rule to be kept and auto-applied
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Window used when reporting on recent patterns
    #[serde(default = "default_learning_window_days")]
    pub learning_window_days: u32,

    /// Patterns not seen for this long are removed on compaction
    #[serde(default = "default_pattern_retention_days")]
    pub pattern_retention_days: u32,

    /// Apply rules to discovered test files during a cycle
    #[serde(default = "default_true")]
    pub auto_apply_fixes: bool,
}

const fn default_min_pattern_frequency() -> u32 {
    3
}

const fn default_confidence_threshold() -> f64 {
    0.7
}

const fn default_learning_window_days() -> u32 {
    7
}

const fn default_pattern_retention_days() -> u32 {
    90
}

const fn default_true() -> bool {
    true
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_pattern_frequency: default_min_pattern_frequency(),
            confidence_threshold: default_confidence_threshold(),
            learning_window_days: default_learning_window_days(),
            pattern_retention_days: default_pattern_retention_days(),
            auto_apply_fixes: default_true(),
        }
    }
}

/// Run-history analytics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalyticsConfig {
    /// Number of runs kept on history compaction
    #[serde(default = "default_max_history_runs")]
    pub max_history_runs: usize,

    /// Write a plain-text insights report after each analysis in a cycle
    #[serde(default = "default_true")]
    pub export_reports: bool,

    /// Generate predictive tests at the end of a cycle
    #[serde(default = "default_true")]
    pub include_predictive: bool,

    /// Components predictive tests are generated for
    #[serde(default = "default_predictive_components")]
    pub predictive_components: Vec<String>,
}

const fn default_max_history_runs() -> usize {
    500
}

fn default_predictive_components() -> Vec<String> {
    ["authentication", "checkout", "product_search", "cart"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_history_runs: default_max_history_runs(),
            export_reports: default_true(),
            include_predictive: default_true(),
            predictive_components: default_predictive_components(),
        }
    }
}

/// Test synthesizer collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SynthesizerConfig {
    /// Base URL of the synthesizer service
    #[serde(default = "default_synthesizer_url")]
    pub base_url: String,

    /// Bearer token; falls back to `MCP_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_synthesizer_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side request rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

fn default_synthesizer_url() -> String {
    "http://localhost:3003".to_string()
}

const fn default_synthesizer_timeout_secs() -> u64 {
    30
}

const fn default_requests_per_second() -> f64 {
    5.0
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            base_url: default_synthesizer_url(),
            api_key: None,
            timeout_secs: default_synthesizer_timeout_secs(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// External test runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Program to execute
    #[serde(default = "default_runner_program")]
    pub program: String,

    /// Arguments placed before the report flags and file list
    #[serde(default = "default_runner_args")]
    pub args: Vec<String>,

    /// Directories scanned for test files
    #[serde(default = "default_test_dirs")]
    pub test_dirs: Vec<String>,

    /// Structured report file written by the runner
    #[serde(default = "default_report_file")]
    pub report_file: String,

    /// Kill the runner after this many seconds
    #[serde(default = "default_runner_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_runner_program() -> String {
    "python".to_string()
}

fn default_runner_args() -> Vec<String> {
    vec!["-m".to_string(), "pytest".to_string(), "-v".to_string()]
}

fn default_test_dirs() -> Vec<String> {
    vec![
        "tests".to_string(),
        default_generated_tests_dir(),
        default_predictive_tests_dir(),
    ]
}

fn default_report_file() -> String {
    "test_results.json".to_string()
}

const fn default_runner_timeout_secs() -> u64 {
    300
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: default_runner_program(),
            args: default_runner_args(),
            test_dirs: default_test_dirs(),
            report_file: default_report_file(),
            timeout_secs: default_runner_timeout_secs(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Log file rotation policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log rotation policy for file output
    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}
