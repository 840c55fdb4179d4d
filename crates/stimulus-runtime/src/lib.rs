//! # stimulus-runtime
//!
//! Model-backed stimulus synthesis on top of `stimulus-core`.
//!
//! The core crate is pure: it builds prompts and repairs completions. This
//! crate adds the parts that talk to the outside world:
//! - **providers**: HTTP completion clients behind cargo features
//! - **history**: recently emitted labels fed back as exclusions
//! - **orchestrator**: one prompt, one completion, one repaired set
//!
//! ## Example
//!
//! ```rust,ignore
//! use stimulus_runtime::{ClientRegistry, EngineConfig, SynthesisOrchestrator};
//! use stimulus_core::{ProgramType, RequestFields, SynthesisRequest};
//!
//! let config = EngineConfig::from_yaml_file("stimulus.yaml")?;
//! let orchestrator = SynthesisOrchestrator::from_config(&config, &ClientRegistry::with_defaults())?;
//!
//! let request = SynthesisRequest::new(
//!     ProgramType::Tacting,
//!     RequestFields::new().with("title", "Farm animals").with("numTrials", 5),
//! );
//! let set = orchestrator.synthesize(&request).await?;
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod providers;
pub mod usage;

pub use config::{ConfigError, EngineConfig};
pub use error::SynthesisError;
pub use history::{HistoryStore, InMemoryHistory, DEFAULT_HISTORY_CAPACITY};
pub use orchestrator::{SynthesisOrchestrator, SynthesisOrchestratorBuilder};
pub use providers::{
    ChatMessage, ClientFactory, ClientRegistry, CompletionClient, CompletionConfig,
    CompletionResponse, ProviderError, TokenUsage,
};
pub use usage::{UsageSummary, UsageTracker};
