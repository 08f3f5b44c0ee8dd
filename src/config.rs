//! Configuration for the concierge pipeline.
//!
//! Covers model selection, the LLM endpoint, observability sinks, memory
//! persistence and the data files backing the lookup tools. Every value has
//! a default under `./run_artifacts` and can be overridden from the
//! environment.

use std::path::PathBuf;

use thiserror::Error;

/// Root directory for everything a run writes to disk.
pub const DEFAULT_ARTIFACTS_DIR: &str = "./run_artifacts";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// No model endpoint is configured and the offline fallback is not allowed.
    #[error("No LLM available. Set LITELLM_API_BASE or ALLOW_STUB_LLM=true to use the offline rule-based fallback.")]
    NoGenerationBackend,
}

/// Settings that describe the model used by the agents.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model identifier sent to the endpoint.
    pub model_name: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens per response.
    pub max_output_tokens: u32,
    /// Base URL of an OpenAI-compatible endpoint, if any.
    pub api_base: Option<String>,
    /// API key for the endpoint.
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: "gemini/gemini-1.5-flash".to_string(),
            temperature: 0.2,
            max_output_tokens: 2048,
            api_base: None,
            api_key: None,
        }
    }
}

/// Paths and toggles for logging, tracing and metrics.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Directory holding the JSON log file `concierge.log`.
    pub logs_path: PathBuf,
    /// JSONL file trace events are appended to.
    pub traces_path: PathBuf,
    /// Prometheus text file overwritten on every emit.
    pub metrics_path: PathBuf,
    /// Directory holding one plan artifact per run.
    pub plans_path: PathBuf,
    /// Log filter used when neither `RUST_LOG` nor `--log-level` is given.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let root = PathBuf::from(DEFAULT_ARTIFACTS_DIR);
        Self {
            logs_path: root.join("logs"),
            traces_path: root.join("logs").join("traces.jsonl"),
            metrics_path: root.join("metrics").join("latest.prom"),
            plans_path: root.join("plans"),
            log_level: "info".to_string(),
        }
    }
}

/// Session and long-term memory settings.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// JSON file backing long-term memory.
    pub long_term_path: PathBuf,
    /// Session time-to-live in minutes.
    pub session_ttl_minutes: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            long_term_path: PathBuf::from(DEFAULT_ARTIFACTS_DIR).join("memory_bank.json"),
            session_ttl_minutes: 1440,
        }
    }
}

/// Data files backing the lookup tools.
///
/// A path that does not exist falls back to the bundled sample dataset.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub civic_data_path: PathBuf,
    pub grant_catalog_path: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            civic_data_path: PathBuf::from("data/city_emissions_sample.json"),
            grant_catalog_path: PathBuf::from("data/grants_catalog_sample.json"),
        }
    }
}

/// Aggregate configuration shared across the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct ConciergeConfig {
    pub model: ModelConfig,
    pub observability: ObservabilityConfig,
    pub memory: MemoryConfig,
    pub tools: ToolConfig,
    /// Permit the deterministic offline responder when no endpoint is set.
    pub allow_stub_llm: bool,
}

impl ConciergeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CONCIERGE_MODEL`: Model identifier (default: gemini/gemini-1.5-flash)
    /// - `CONCIERGE_TEMPERATURE`: Sampling temperature (default: 0.2)
    /// - `CONCIERGE_MAX_OUTPUT_TOKENS`: Max tokens per response (default: 2048)
    /// - `LITELLM_API_BASE`: OpenAI-compatible endpoint base URL
    /// - `LITELLM_API_KEY`: Endpoint API key
    /// - `ALLOW_STUB_LLM`: Allow the offline fallback (default: false)
    /// - `CONCIERGE_LOGS_PATH`, `CONCIERGE_TRACES_PATH`, `CONCIERGE_METRICS_PATH`,
    ///   `CONCIERGE_PLANS_PATH`: Observability sinks
    /// - `LOG_LEVEL`: Default log filter (default: info)
    /// - `CONCIERGE_MEMORY_PATH`: Long-term memory file
    /// - `SESSION_TTL_MINUTES`: Session TTL (default: 1440)
    /// - `CIVIC_DATA_PATH`, `GRANT_CATALOG_PATH`: Tool datasets
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value or the
    /// resulting configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CONCIERGE_MODEL") {
            config.model.model_name = val;
        }

        if let Ok(val) = std::env::var("CONCIERGE_TEMPERATURE") {
            config.model.temperature = parse_env_value(&val, "CONCIERGE_TEMPERATURE")?;
        }

        if let Ok(val) = std::env::var("CONCIERGE_MAX_OUTPUT_TOKENS") {
            config.model.max_output_tokens = parse_env_value(&val, "CONCIERGE_MAX_OUTPUT_TOKENS")?;
        }

        config.model.api_base = non_empty_env("LITELLM_API_BASE");
        config.model.api_key = non_empty_env("LITELLM_API_KEY");

        if let Ok(val) = std::env::var("ALLOW_STUB_LLM") {
            config.allow_stub_llm = parse_env_bool(&val, "ALLOW_STUB_LLM")?;
        }

        if let Ok(val) = std::env::var("CONCIERGE_LOGS_PATH") {
            config.observability.logs_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CONCIERGE_TRACES_PATH") {
            config.observability.traces_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CONCIERGE_METRICS_PATH") {
            config.observability.metrics_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CONCIERGE_PLANS_PATH") {
            config.observability.plans_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("LOG_LEVEL") {
            config.observability.log_level = val.to_lowercase();
        }

        if let Ok(val) = std::env::var("CONCIERGE_MEMORY_PATH") {
            config.memory.long_term_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("SESSION_TTL_MINUTES") {
            config.memory.session_ttl_minutes = parse_env_value(&val, "SESSION_TTL_MINUTES")?;
        }

        if let Ok(val) = std::env::var("CIVIC_DATA_PATH") {
            config.tools.civic_data_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("GRANT_CATALOG_PATH") {
            config.tools.grant_catalog_path = PathBuf::from(val);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.model_name.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model_name cannot be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationFailed(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.model.max_output_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_output_tokens must be greater than 0".to_string(),
            ));
        }

        if self.memory.session_ttl_minutes == 0 {
            return Err(ConfigError::ValidationFailed(
                "session_ttl_minutes must be greater than 0".to_string(),
            ));
        }

        let paths = [
            ("traces_path", &self.observability.traces_path),
            ("metrics_path", &self.observability.metrics_path),
            ("plans_path", &self.observability.plans_path),
            ("long_term_path", &self.memory.long_term_path),
        ];
        for (name, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} cannot be empty",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Builder method to allow the offline fallback responder.
    pub fn with_allow_stub_llm(mut self, allow: bool) -> Self {
        self.allow_stub_llm = allow;
        self
    }

    /// Builder method to point every artifact at a single root directory.
    pub fn with_artifacts_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.observability.logs_path = root.join("logs");
        self.observability.traces_path = root.join("logs").join("traces.jsonl");
        self.observability.metrics_path = root.join("metrics").join("latest.prom");
        self.observability.plans_path = root.join("plans");
        self.memory.long_term_path = root.join("memory_bank.json");
        self
    }

    /// Builder method to set the session TTL.
    pub fn with_session_ttl_minutes(mut self, minutes: u32) -> Self {
        self.memory.session_ttl_minutes = minutes;
        self
    }

    /// Builder method to set the model endpoint.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.model.api_base = Some(api_base.into());
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env_value<T>(value: &str, key: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConciergeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.memory.session_ttl_minutes, 1440);
        assert!(!config.allow_stub_llm);
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let mut config = ConciergeConfig::default();
        config.model.temperature = 2.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = ConciergeConfig::default().with_session_ttl_minutes(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_artifacts_root_moves_every_sink() {
        let config = ConciergeConfig::default().with_artifacts_root("/tmp/concierge");
        assert_eq!(
            config.observability.traces_path,
            PathBuf::from("/tmp/concierge/logs/traces.jsonl")
        );
        assert_eq!(
            config.memory.long_term_path,
            PathBuf::from("/tmp/concierge/memory_bank.json")
        );
        assert_eq!(
            config.observability.plans_path,
            PathBuf::from("/tmp/concierge/plans")
        );
    }

    #[test]
    fn test_parse_env_bool_variants() {
        assert!(parse_env_bool("TRUE", "X").unwrap());
        assert!(!parse_env_bool("off", "X").unwrap());
        assert!(parse_env_bool("maybe", "X").is_err());
    }

    #[test]
    fn test_parse_env_value_reports_key() {
        let err = parse_env_value::<u32>("abc", "SESSION_TTL_MINUTES").unwrap_err();
        assert!(err.to_string().contains("SESSION_TTL_MINUTES"));
    }
}
