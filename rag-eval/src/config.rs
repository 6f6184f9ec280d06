//! Configuration management for the RAG evaluator
//!
//! Loads judge, client and output settings from TOML files and provides
//! runtime access. The scorer registry itself is not configurable here; it
//! is fixed at startup by [`crate::analysis::ScorerRegistry`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Evaluation engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Scoring mode name, parsed by [`ScoringMode::from_str`]
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Batch failure policy name, parsed by [`FailurePolicy::from_str`]
    #[serde(default = "default_failure_policy")]
    pub failure_policy: String,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            failure_policy: default_failure_policy(),
        }
    }
}

/// External judgment client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Requests per minute
    #[serde(default = "default_rpm")]
    pub rpm: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
            rpm: default_rpm(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,
    #[serde(default = "default_true")]
    pub write_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
            write_json: true,
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_mode() -> String { "heuristic".to_string() }
fn default_failure_policy() -> String { "abort".to_string() }
fn default_base_url() -> String { "https://api.mistral.ai/v1".to_string() }
fn default_model() -> String { "mistral-7b-instruct".to_string() }
fn default_api_key_env() -> String { "MISTRAL_API_KEY".to_string() }
fn default_max_tokens() -> u32 { 16 }
fn default_retry_count() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 1000 }
fn default_max_retry_delay_ms() -> u64 { 60_000 }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_rpm() -> u32 { 60 }
fn default_reports_dir() -> String { "reports".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from default config location or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = [
            "config/rag-eval.toml",
            "../config/rag-eval.toml",
        ];

        for path in &config_paths {
            if let Ok(config) = Self::from_file(path) {
                tracing::info!("Loaded configuration from {}", path);
                return config;
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Parsed scoring mode
    pub fn scoring_mode(&self) -> Result<ScoringMode, ConfigError> {
        self.judge.mode.parse()
    }

    /// Parsed batch failure policy
    pub fn failure_policy(&self) -> Result<FailurePolicy, ConfigError> {
        self.judge.failure_policy.parse()
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported mode: {0} (expected \"heuristic\" or \"external\")")]
    UnknownMode(String),

    #[error("Unsupported failure policy: {0} (expected \"abort\" or \"best_effort\")")]
    UnknownFailurePolicy(String),

    #[error("Scorer registry is empty")]
    EmptyRegistry,

    #[error("Duplicate scorer name: {0}")]
    DuplicateScorer(String),

    #[error("Scorer {name} must have a positive max_raw")]
    InvalidMaxRaw { name: String },

    #[error("Scorer {name} has invalid weight {weight}")]
    InvalidWeight { name: String, weight: f64 },

    #[error("Scorer weights sum to {sum}, expected 1.0")]
    WeightSum { sum: f64 },

    #[error("External mode requires a judgment client")]
    MissingClient,
}

/// Which of a dimension's two scoring functions the engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Deterministic local rules over text
    Heuristic,
    /// Rubric prompts delegated to an external judgment service
    External,
}

impl ScoringMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMode::Heuristic => "heuristic",
            ScoringMode::External => "external",
        }
    }
}

impl FromStr for ScoringMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heuristic" => Ok(ScoringMode::Heuristic),
            "external" | "llm" => Ok(ScoringMode::External),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the batch runner does when one example fails to score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing example and surface its error
    #[default]
    Abort,
    /// Record a failure marker for the example and keep going
    BestEffort,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::BestEffort => "best_effort",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(FailurePolicy::Abort),
            "best_effort" | "best-effort" => Ok(FailurePolicy::BestEffort),
            _ => Err(ConfigError::UnknownFailurePolicy(s.to_string())),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scoring_mode().unwrap(), ScoringMode::Heuristic);
        assert_eq!(config.failure_policy().unwrap(), FailurePolicy::Abort);
        assert_eq!(config.client.api_key_env, "MISTRAL_API_KEY");
        assert_eq!(config.client.max_tokens, 16);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[judge]
mode = "external"
failure_policy = "best_effort"

[client]
model = "mistral-small"
retry_count = 1
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.scoring_mode().unwrap(), ScoringMode::External);
        assert_eq!(config.failure_policy().unwrap(), FailurePolicy::BestEffort);
        assert_eq!(config.client.model, "mistral-small");
        assert_eq!(config.client.retry_count, 1);
        // untouched fields keep their defaults
        assert_eq!(config.client.timeout_ms, 30_000);
        assert_eq!(config.output.reports_dir, "reports");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag-eval.toml");
        Config::default().save_toml(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.judge.mode, "heuristic");
        assert_eq!(loaded.client.base_url, "https://api.mistral.ai/v1");
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("heuristic".parse::<ScoringMode>().unwrap(), ScoringMode::Heuristic);
        assert_eq!("external".parse::<ScoringMode>().unwrap(), ScoringMode::External);
        assert_eq!("llm".parse::<ScoringMode>().unwrap(), ScoringMode::External);
        assert_eq!(
            "foo".parse::<ScoringMode>(),
            Err(ConfigError::UnknownMode("foo".to_string()))
        );
    }

    #[test]
    fn test_mode_names_are_exact() {
        for name in [" External ", "External", "LLM", "heuristic\n"] {
            assert_eq!(
                name.parse::<ScoringMode>(),
                Err(ConfigError::UnknownMode(name.to_string()))
            );
        }
    }

    #[test]
    fn test_failure_policy_parsing() {
        assert_eq!("best-effort".parse::<FailurePolicy>().unwrap(), FailurePolicy::BestEffort);
        assert_eq!("best_effort".parse::<FailurePolicy>().unwrap(), FailurePolicy::BestEffort);
        assert!("retry".parse::<FailurePolicy>().is_err());
        assert!("Abort".parse::<FailurePolicy>().is_err());
    }
}
