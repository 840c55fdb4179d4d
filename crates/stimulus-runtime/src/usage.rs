//! Token accounting across completions.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::providers::TokenUsage;

/// Accumulated usage for an orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub prompt_tokens: u64,

    pub completion_tokens: u64,

    /// Completions that returned a response
    pub calls: u32,

    /// Completions that failed or timed out
    pub failures: u32,
}

impl UsageSummary {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Thread-safe usage accumulator.
#[derive(Debug, Default)]
pub struct UsageTracker {
    summary: RwLock<UsageSummary>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, usage: &TokenUsage) {
        let mut summary = self.summary.write();
        summary.prompt_tokens += u64::from(usage.prompt_tokens);
        summary.completion_tokens += u64::from(usage.completion_tokens);
        summary.calls += 1;
    }

    pub fn record_failure(&self) {
        self.summary.write().failures += 1;
    }

    pub fn summary(&self) -> UsageSummary {
        *self.summary.read()
    }

    pub fn reset(&self) {
        *self.summary.write() = UsageSummary::default();
    }
}
