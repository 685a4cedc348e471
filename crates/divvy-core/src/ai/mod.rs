//! Reasoning provider abstraction
//!
//! The "intelligence" of the split suggestion flow is delegated to an
//! external chat-completion API. That dependency is opaque, slow, and
//! fallible, so it sits behind a small trait with two implementations:
//! an OpenAI-compatible HTTP backend and a scripted mock for tests.
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: `openai` (default) or `mock`
//! - `OPENAI_API_KEY`: bearer credential (required for the openai backend)
//! - `OPENAI_BASE_URL`: server URL (default: https://api.openai.com)
//! - `OPENAI_MODEL`: model name (default: gpt-4o-mini)
//! - `DIVVY_AI_TIMEOUT_SECS`: per-request timeout (default: 20)

mod mock;
mod openai;
pub mod parsing;

pub use mock::MockBackend;
pub use openai::OpenAiBackend;

use async_trait::async_trait;

use crate::error::Result;

/// Interface to the external reasoning provider.
///
/// One method, one call: no retries live here. The remote call costs money
/// per invocation and is not idempotent-safe, so retry policy belongs to
/// the caller.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Send a system + user instruction pair, return the raw text completion
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete reasoning client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ReasoningClient {
    /// OpenAI-compatible chat completions API
    OpenAi(OpenAiBackend),
    /// Scripted backend for testing
    Mock(MockBackend),
}

impl ReasoningClient {
    /// Create a reasoning client from environment variables.
    ///
    /// Returns None when the selected backend is not configured (for the
    /// openai backend: no `OPENAI_API_KEY`). A None client means the engine
    /// runs fallback-only, which is deliberately distinct from "provider
    /// down".
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai".to_string());

        match backend.to_lowercase().as_str() {
            "openai" => OpenAiBackend::from_env().map(ReasoningClient::OpenAi),
            "mock" => Some(ReasoningClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to openai");
                OpenAiBackend::from_env().map(ReasoningClient::OpenAi)
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ReasoningClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl ReasoningBackend for ReasoningClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        match self {
            ReasoningClient::OpenAi(b) => b.complete(system, prompt).await,
            ReasoningClient::Mock(b) => b.complete(system, prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ReasoningClient::OpenAi(b) => b.health_check().await,
            ReasoningClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ReasoningClient::OpenAi(b) => b.model(),
            ReasoningClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            ReasoningClient::OpenAi(b) => b.host(),
            ReasoningClient::Mock(b) => b.host(),
        }
    }
}
