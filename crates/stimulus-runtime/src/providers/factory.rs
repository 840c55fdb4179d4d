//! Name-based client construction.
//!
//! Each provider registers a [`ClientFactory`]; configuration picks one by
//! name and hands it a JSON settings object.
//!
//! ```ignore
//! let registry = ClientRegistry::with_defaults();
//! registry.validate("openai", &settings)?;
//! let client = registry.create("openai", &settings)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{CompletionClient, ProviderError};

/// Builds one kind of [`CompletionClient`] from JSON settings.
pub trait ClientFactory: Send + Sync {
    /// Provider name used in configuration (e.g. "anthropic").
    fn provider_type(&self) -> &'static str;

    fn create(&self, settings: &JsonValue) -> Result<Arc<dyn CompletionClient>, ProviderError>;

    /// Check settings without building a client.
    fn validate_settings(&self, settings: &JsonValue) -> Result<(), ProviderError>;

    fn description(&self) -> &'static str {
        "Completion provider"
    }
}

/// Registered client factories, keyed by provider name.
#[derive(Default)]
pub struct ClientRegistry {
    factories: BTreeMap<String, Arc<dyn ClientFactory>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any with the same name.
    pub fn register(&mut self, factory: Arc<dyn ClientFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    pub fn create(
        &self,
        provider_type: &str,
        settings: &JsonValue,
    ) -> Result<Arc<dyn CompletionClient>, ProviderError> {
        self.factory(provider_type)?.create(settings)
    }

    pub fn validate(&self, provider_type: &str, settings: &JsonValue) -> Result<(), ProviderError> {
        self.factory(provider_type)?.validate_settings(settings)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    fn factory(&self, provider_type: &str) -> Result<&Arc<dyn ClientFactory>, ProviderError> {
        self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })
    }

    /// Registry with every provider compiled into this build.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "anthropic")]
        registry.register(Arc::new(super::AnthropicClientFactory));

        #[cfg(feature = "openai")]
        registry.register(Arc::new(super::OpenAiClientFactory));

        registry
    }
}

/// `base_url`, when set, must be an http(s) URL.
#[cfg_attr(not(any(feature = "anthropic", feature = "openai")), allow(dead_code))]
pub(crate) fn check_base_url(settings: &JsonValue) -> Result<(), ProviderError> {
    match settings.get("base_url").and_then(JsonValue::as_str) {
        Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => Err(
            ProviderError::NotConfigured("base_url must start with http:// or https://".into()),
        ),
        _ => Ok(()),
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse};
    use async_trait::async_trait;

    struct EchoClient {
        name: String,
    }

    #[async_trait]
    impl CompletionClient for EchoClient {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(CompletionResponse::text(last))
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    struct EchoFactory;

    impl ClientFactory for EchoFactory {
        fn provider_type(&self) -> &'static str {
            "echo"
        }

        fn create(&self, settings: &JsonValue) -> Result<Arc<dyn CompletionClient>, ProviderError> {
            self.validate_settings(settings)?;
            let name = settings["name"].as_str().unwrap_or("echo").to_string();
            Ok(Arc::new(EchoClient { name }))
        }

        fn validate_settings(&self, settings: &JsonValue) -> Result<(), ProviderError> {
            if settings.get("broken").is_some() {
                return Err(ProviderError::NotConfigured("broken settings".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = ClientRegistry::new();
        registry.register(Arc::new(EchoFactory));

        assert!(registry.has_provider("echo"));
        let client = registry
            .create("echo", &serde_json::json!({"name": "custom"}))
            .unwrap();
        assert_eq!(client.name(), "custom");
    }

    #[tokio::test]
    async fn test_created_client_completes() {
        let mut registry = ClientRegistry::new();
        registry.register(Arc::new(EchoFactory));
        let client = registry.create("echo", &serde_json::json!({})).unwrap();

        let response = client
            .complete(vec![ChatMessage::user("ping")], &CompletionConfig::default())
            .await
            .unwrap();
        assert_eq!(response.content, "ping");
    }

    #[test]
    fn test_unknown_provider_lists_available() {
        let mut registry = ClientRegistry::new();
        registry.register(Arc::new(EchoFactory));

        let err = registry.create("missing", &serde_json::json!({})).err().expect("expected error");
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn test_validate_delegates() {
        let mut registry = ClientRegistry::new();
        registry.register(Arc::new(EchoFactory));

        assert!(registry.validate("echo", &serde_json::json!({})).is_ok());
        assert!(registry
            .validate("echo", &serde_json::json!({"broken": true}))
            .is_err());
    }

    #[test]
    fn test_with_defaults_matches_features() {
        let registry = ClientRegistry::with_defaults();
        assert_eq!(registry.has_provider("anthropic"), cfg!(feature = "anthropic"));
        assert_eq!(registry.has_provider("openai"), cfg!(feature = "openai"));
    }
}
