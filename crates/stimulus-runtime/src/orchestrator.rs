//! Synthesis orchestrator.
//!
//! One call to [`SynthesisOrchestrator::synthesize`] runs the whole loop:
//! - look up the history window for the request's key
//! - build the prompt with those labels excluded
//! - make one completion call under the configured timeout
//! - parse and normalize whatever came back
//! - record the emitted labels for next time
//!
//! Only the completion call can fail. Everything after it is total.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use stimulus_core::parser::remove_fence_lines;
use stimulus_core::text::same_label;
use stimulus_core::{
    normalize, parse_traced, prompts, ProgramType, RequestFields, StimulusSet, SynthesisRequest,
};

use crate::config::EngineConfig;
use crate::error::SynthesisError;
use crate::history::{HistoryStore, InMemoryHistory};
use crate::providers::{
    ChatMessage, ClientRegistry, CompletionClient, CompletionConfig, CompletionResponse,
};
use crate::usage::{UsageSummary, UsageTracker};

/// Drives prompt, completion, repair and history for each request.
///
/// `Send + Sync`; share it behind an `Arc`.
pub struct SynthesisOrchestrator {
    client: Arc<dyn CompletionClient>,
    history: Arc<dyn HistoryStore>,
    completion: CompletionConfig,
    usage: UsageTracker,
}

impl SynthesisOrchestrator {
    /// Orchestrator with in-memory history and default settings.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            history: Arc::new(InMemoryHistory::new()),
            completion: CompletionConfig::default(),
            usage: UsageTracker::new(),
        }
    }

    pub fn builder() -> SynthesisOrchestratorBuilder {
        SynthesisOrchestratorBuilder::new()
    }

    /// Validate `config` and build its provider from `registry`.
    pub fn from_config(
        config: &EngineConfig,
        registry: &ClientRegistry,
    ) -> Result<Self, SynthesisError> {
        config.validate()?;
        registry.validate(&config.provider, &config.provider_settings)?;
        let client = registry.create(&config.provider, &config.provider_settings)?;

        Self::builder().client(client).config(config).build()
    }

    /// Generate one stimulus set.
    pub async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<StimulusSet, SynthesisError> {
        let started = Instant::now();
        let program = request.program_type;
        let key = request.history_key();

        let exclusions = merge_exclusions(self.history.get(&key), request.fields.excluded_labels());
        debug!(
            program = %program,
            history_key = %key,
            exclusions = exclusions.len(),
            "Building prompt"
        );

        let prompt = prompts::build(program, &request.fields, &exclusions);
        let response = self
            .complete(vec![
                ChatMessage::system(prompt.system),
                ChatMessage::user(prompt.user),
            ])
            .await?;

        let (parsed, strategy) = parse_traced(&response.content);
        let set = normalize(program, &parsed, &request.fields, &response.content);

        let emitted = set.emitted_labels();
        let expected = prompts::required_total(program, &request.fields);
        if emitted.len() < expected {
            warn!(
                program = %program,
                history_key = %key,
                strategy = strategy.name(),
                expected,
                produced = emitted.len(),
                "Completion yielded fewer stimuli than requested"
            );
        }

        self.history.append(&key, &emitted);

        info!(
            program = %program,
            history_key = %key,
            strategy = strategy.name(),
            produced = emitted.len(),
            tokens = response.usage.total(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Synthesis complete"
        );

        Ok(set)
    }

    /// Plain-text teaching instructions for a program.
    ///
    /// The completion is returned as prose with fence lines removed. History
    /// is neither read nor updated.
    pub async fn build_teaching_instructions(
        &self,
        program: ProgramType,
        fields: &RequestFields,
    ) -> Result<String, SynthesisError> {
        let prompt = prompts::teaching_instructions(program, fields);
        let response = self
            .complete(vec![
                ChatMessage::system(prompt.system),
                ChatMessage::user(prompt.user),
            ])
            .await?;

        info!(program = %program, tokens = response.usage.total(), "Teaching instructions ready");
        Ok(remove_fence_lines(&response.content))
    }

    pub fn usage(&self) -> UsageSummary {
        self.usage.summary()
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub fn completion_config(&self) -> &CompletionConfig {
        &self.completion
    }

    /// One completion under the configured timeout. No retries.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<CompletionResponse, SynthesisError> {
        let timeout = self.completion.timeout;

        match tokio::time::timeout(timeout, self.client.complete(messages, &self.completion)).await
        {
            Ok(Ok(response)) => {
                self.usage.record(&response.usage);
                debug!(
                    provider = self.client.name(),
                    prompt_tokens = response.usage.prompt_tokens,
                    completion_tokens = response.usage.completion_tokens,
                    "Completion received"
                );
                Ok(response)
            }
            Ok(Err(e)) => {
                self.usage.record_failure();
                warn!(provider = self.client.name(), error = %e, "Completion failed");
                Err(e.into())
            }
            Err(_) => {
                self.usage.record_failure();
                warn!(provider = self.client.name(), timeout = ?timeout, "Completion timed out");
                Err(SynthesisError::UpstreamTimeout(timeout))
            }
        }
    }
}

impl std::fmt::Debug for SynthesisOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisOrchestrator")
            .field("provider", &self.client.name())
            .field("completion", &self.completion)
            .finish()
    }
}

/// History first, then caller exclusions not already present.
fn merge_exclusions(history: Vec<String>, requested: Vec<String>) -> Vec<String> {
    let mut merged = history;
    for label in requested {
        if !merged.iter().any(|seen| same_label(seen, &label)) {
            merged.push(label);
        }
    }
    merged
}

/// Builder for [`SynthesisOrchestrator`].
#[derive(Default)]
pub struct SynthesisOrchestratorBuilder {
    client: Option<Arc<dyn CompletionClient>>,
    history: Option<Arc<dyn HistoryStore>>,
    completion: CompletionConfig,
    history_capacity: Option<usize>,
}

impl SynthesisOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Required.
    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Replaces the default in-memory history.
    pub fn history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn completion_config(mut self, completion: CompletionConfig) -> Self {
        self.completion = completion;
        self
    }

    /// Completion settings and history capacity from an [`EngineConfig`].
    pub fn config(mut self, config: &EngineConfig) -> Self {
        self.completion = config.completion_config();
        self.history_capacity = Some(config.history_capacity);
        self
    }

    pub fn build(self) -> Result<SynthesisOrchestrator, SynthesisError> {
        let client = self
            .client
            .ok_or_else(|| SynthesisError::Configuration("No completion client set".to_string()))?;

        let capacity = self.history_capacity;
        let history = self.history.unwrap_or_else(|| match capacity {
            Some(capacity) => Arc::new(InMemoryHistory::with_capacity(capacity)),
            None => Arc::new(InMemoryHistory::new()),
        });

        Ok(SynthesisOrchestrator {
            client,
            history,
            completion: self.completion,
            usage: UsageTracker::new(),
        })
    }
}
