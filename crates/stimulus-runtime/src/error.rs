//! Errors surfaced by synthesis.
//!
//! Malformed completions are never errors; the parser and normalizer absorb
//! them. Only credential and upstream failures reach the caller.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::providers::ProviderError;

/// Why a synthesis call produced no stimuli.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Upstream network failure: {0}")]
    UpstreamNetworkFailure(String),

    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SynthesisError {
    /// Fixable by the operator rather than by waiting.
    pub fn is_configuration_problem(&self) -> bool {
        matches!(
            self,
            SynthesisError::MissingCredential(_) | SynthesisError::Configuration(_)
        )
    }

    /// Text suitable for an end user.
    pub fn user_message(&self) -> &'static str {
        if self.is_configuration_problem() {
            "Stimulus generation is not configured. Check the provider settings and API key."
        } else {
            "The stimulus generation service is unavailable right now. Please try again."
        }
    }
}

impl From<ProviderError> for SynthesisError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::MissingCredential(msg) => SynthesisError::MissingCredential(msg),
            ProviderError::NotConfigured(msg) => SynthesisError::Configuration(msg),
            ProviderError::Http(msg) | ProviderError::Decode(msg) => {
                SynthesisError::UpstreamNetworkFailure(msg)
            }
            ProviderError::Status { status, message } => SynthesisError::UpstreamStatus {
                status,
                body: message,
            },
            ProviderError::RateLimited { retry_after } => SynthesisError::UpstreamStatus {
                status: 429,
                body: match retry_after {
                    Some(wait) => format!("rate limited, retry after {}s", wait.as_secs()),
                    None => "rate limited".to_string(),
                },
            },
            ProviderError::Timeout(after) => SynthesisError::UpstreamTimeout(after),
        }
    }
}

impl From<ConfigError> for SynthesisError {
    fn from(error: ConfigError) -> Self {
        SynthesisError::Configuration(error.to_string())
    }
}
