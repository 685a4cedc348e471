//! Scripted reasoning backend for testing
//!
//! Returns a configurable completion without any network I/O. Useful for
//! unit tests and for developing against the engine without a credential.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::ReasoningBackend;

/// Default completion: a minimal valid suggestion body. The parser resolves
/// the unknown group id to the first candidate, so this exercises the full
/// validation path.
const DEFAULT_RESPONSE: &str = r#"{
  "confidence": 0.8,
  "splitType": "equal",
  "reasoning": "Scripted suggestion",
  "groupSuggestions": [
    {"groupId": "mock-group", "confidence": 0.8, "reasoning": "Scripted match", "matchingFactors": ["category"]}
  ],
  "suggestedParticipants": [],
  "amounts": {},
  "categories": []
}"#;

/// Mock reasoning backend
#[derive(Clone)]
pub struct MockBackend {
    /// Completion text returned by `complete`
    response: String,
    /// Whether calls should fail with a provider error
    failing: bool,
    /// Whether health_check should return true
    healthy: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a mock that returns a minimal valid suggestion
    pub fn new() -> Self {
        Self {
            response: DEFAULT_RESPONSE.to_string(),
            failing: false,
            healthy: true,
        }
    }

    /// Create a mock that returns the given completion text verbatim
    pub fn with_response(response: &str) -> Self {
        Self {
            response: response.to_string(),
            failing: false,
            healthy: true,
        }
    }

    /// Create a mock that fails every call with a provider error
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            failing: true,
            healthy: false,
        }
    }
}

#[async_trait]
impl ReasoningBackend for MockBackend {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        if self.failing {
            return Err(Error::Provider {
                status: 503,
                body: "mock backend configured to fail".into(),
            });
        }
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
