//! API key handling for completion clients.
//!
//! Keys come from provider settings first, then from the environment. They
//! are wrapped in [`secrecy::SecretString`] as soon as they are read and
//! only leave it at the point an HTTP header is written.
//!
//! ```ignore
//! let key = ApiCredential::from_config_or_env(&settings, "api_key", "OPENAI_API_KEY", "OpenAI API key")?;
//! request.bearer_auth(key.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Provider settings (`api_key`)
    Config,
    /// Environment variable
    Environment,
    /// Passed in by code
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self {
            CredentialSource::Config => "config",
            CredentialSource::Environment => "environment",
            CredentialSource::Programmatic => "programmatic",
        };
        f.write_str(source)
    }
}

/// An API key that redacts itself in `Debug` and `Display`.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load `config_key` from settings, falling back to `env_var`.
    ///
    /// Blank values count as missing.
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config_value(config, config_key) {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Some(value) = env_value(env_var) {
            return Ok(Self::new(value, CredentialSource::Environment, name));
        }

        Err(ProviderError::MissingCredential(format!(
            "{name} required: set '{config_key}' in provider settings or the {env_var} environment variable"
        )))
    }

    /// Whether [`from_config_or_env`](Self::from_config_or_env) would succeed.
    pub fn is_available(config: &JsonValue, config_key: &str, env_var: &str) -> bool {
        config_value(config, config_key).is_some() || env_value(env_var).is_some()
    }

    /// The raw key. Call only where it is written to a request.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn config_value<'a>(config: &'a JsonValue, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn env_value(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "sk-test-not-a-real-key-0001";

    #[test]
    fn test_debug_and_display_redact() {
        let credential = ApiCredential::new(SECRET, CredentialSource::Config, "Test key");

        let debug = format!("{credential:?}");
        let display = format!("{credential}");
        assert!(!debug.contains(SECRET));
        assert!(!display.contains(SECRET));
        assert!(debug.contains("[REDACTED]"));
        assert!(display.contains("Test key from config"));
    }

    #[test]
    fn test_expose_returns_value() {
        let credential = ApiCredential::new(SECRET, CredentialSource::Programmatic, "Test key");
        assert_eq!(credential.expose(), SECRET);
    }

    #[test]
    fn test_config_wins_over_env() {
        std::env::set_var("STIMULUS_TEST_KEY_PRIORITY", "from-env");
        let config = json!({"api_key": "from-config"});

        let credential =
            ApiCredential::from_config_or_env(&config, "api_key", "STIMULUS_TEST_KEY_PRIORITY", "k")
                .unwrap();
        assert_eq!(credential.expose(), "from-config");
        assert_eq!(credential.source(), CredentialSource::Config);

        std::env::remove_var("STIMULUS_TEST_KEY_PRIORITY");
    }

    #[test]
    fn test_env_fallback() {
        std::env::set_var("STIMULUS_TEST_KEY_FALLBACK", "from-env");

        let credential =
            ApiCredential::from_config_or_env(&json!({}), "api_key", "STIMULUS_TEST_KEY_FALLBACK", "k")
                .unwrap();
        assert_eq!(credential.expose(), "from-env");
        assert_eq!(credential.source(), CredentialSource::Environment);

        std::env::remove_var("STIMULUS_TEST_KEY_FALLBACK");
    }

    #[test]
    fn test_blank_values_are_missing() {
        std::env::set_var("STIMULUS_TEST_KEY_BLANK", "   ");
        let config = json!({"api_key": ""});

        let result =
            ApiCredential::from_config_or_env(&config, "api_key", "STIMULUS_TEST_KEY_BLANK", "k");
        assert!(matches!(result, Err(ProviderError::MissingCredential(_))));
        assert!(!ApiCredential::is_available(&config, "api_key", "STIMULUS_TEST_KEY_BLANK"));

        std::env::remove_var("STIMULUS_TEST_KEY_BLANK");
    }

    #[test]
    fn test_missing_error_names_env_var() {
        let err = ApiCredential::from_config_or_env(
            &json!({}),
            "api_key",
            "STIMULUS_TEST_KEY_UNSET",
            "Test key",
        )
        .unwrap_err();
        assert!(err.to_string().contains("STIMULUS_TEST_KEY_UNSET"));
    }
}
