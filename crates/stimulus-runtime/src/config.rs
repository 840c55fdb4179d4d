//! Engine configuration loaded from YAML.
//!
//! ```yaml
//! provider: anthropic
//! provider_settings:
//!   base_url: https://api.anthropic.com/v1
//! model: claude-sonnet-4-5
//! max_tokens: 2048
//! temperature: 0.7
//! completion_timeout: 45s
//! history_capacity: 40
//! ```
//!
//! API keys belong in the environment, not in this file.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::providers::CompletionConfig;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for a [`SynthesisOrchestrator`](crate::SynthesisOrchestrator)
/// and the client it talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Registered provider name ("anthropic", "openai")
    pub provider: String,

    /// Passed to the provider's factory as-is
    pub provider_settings: JsonValue,

    pub model: String,

    pub max_tokens: u32,

    pub temperature: f32,

    /// Upper bound on one completion call
    #[serde(
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub completion_timeout: Duration,

    /// Entries kept per history key
    pub history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let completion = CompletionConfig::default();
        Self {
            provider: "anthropic".to_string(),
            provider_settings: JsonValue::Object(Default::default()),
            model: completion.model,
            max_tokens: completion.max_tokens,
            temperature: completion.temperature,
            completion_timeout: completion.timeout,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("provider must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.completion_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "completion_timeout must be positive".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be positive".into(),
            ));
        }
        if !self.provider_settings.is_object() {
            return Err(ConfigError::Invalid(
                "provider_settings must be a mapping".into(),
            ));
        }
        if self.provider_settings.get("api_key").is_some() {
            return Err(ConfigError::Invalid(
                "api_key does not belong in the config file; use the provider's environment variable"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Per-call settings handed to the client.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.completion_timeout,
        }
    }
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*duration))
}

/// Accepts "45s", "2m 30s" or a bare number of seconds.
fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => humantime::parse_duration(text.trim()).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.completion_timeout, Duration::from_secs(60));
        assert_eq!(config.history_capacity, 40);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
provider: openai
provider_settings:
  base_url: http://localhost:11434/v1
model: gpt-4o-mini
completion_timeout: 1m 30s
history_capacity: 25
"#;
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.completion_timeout, Duration::from_secs(90));
        assert_eq!(config.history_capacity, 25);
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(
            config.provider_settings["base_url"],
            "http://localhost:11434/v1"
        );
    }

    #[test]
    fn test_numeric_timeout_is_seconds() {
        let config = EngineConfig::from_yaml("completion_timeout: 15").unwrap();
        assert_eq!(config.completion_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_bad_duration_is_yaml_error() {
        let result = EngineConfig::from_yaml("completion_timeout: soon");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(
            EngineConfig::from_yaml("history_capacity: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml("temperature: 3.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml("provider_settings:\n  api_key: sk-oops"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_completion_config() {
        let config = EngineConfig::from_yaml("model: m\nmax_tokens: 10\ntemperature: 0.1").unwrap();
        let completion = config.completion_config();
        assert_eq!(completion.model, "m");
        assert_eq!(completion.max_tokens, 10);
        assert_eq!(completion.timeout, config.completion_timeout);
    }

    #[test]
    fn test_yaml_round_trip_keeps_timeout() {
        let config = EngineConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("1m"));
        assert_eq!(EngineConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = EngineConfig::from_yaml_file("/nonexistent/stimulus.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
