//! OpenAI-compatible reasoning backend
//!
//! Works with any server implementing the `/v1/chat/completions` API.
//! Temperature is kept low (0.3) to favor deterministic-leaning output and
//! the completion is capped at ~1000 tokens, per the suggestion schema's
//! expected size.
//!
//! Error kinds are kept distinct so callers can tell them apart:
//! - `Error::Config` - no credential configured (operator problem)
//! - `Error::Http` - network failure or timeout
//! - `Error::Provider` - non-2xx from the remote service, with status and
//!   a truncated body for diagnostics

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::ReasoningBackend;

/// Default provider URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default model
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Creativity parameter - low, favoring stable output
const TEMPERATURE: f32 = 0.3;

/// Response size cap in tokens
const MAX_TOKENS: u32 = 1000;

/// Default per-request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// How much provider body to keep in error messages
const ERROR_BODY_LIMIT: usize = 500;

/// OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiBackend {
    /// Create a new backend with the default timeout
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self::with_timeout(
            base_url,
            model,
            api_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a new backend with an explicit per-request timeout.
    ///
    /// A timeout surfaces as `Error::Http`, which the engine treats the
    /// same as any other provider failure - fallback, never a hang.
    pub fn with_timeout(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create from environment variables.
    ///
    /// Returns None when `OPENAI_API_KEY` is absent - a missing credential
    /// is a configuration state, not a runtime failure.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout = std::env::var("DIVVY_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Some(Self::with_timeout(
            &base_url,
            &model,
            &api_key,
            Duration::from_secs(timeout),
        ))
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

fn truncate_body(body: &str) -> String {
    if body.len() > ERROR_BODY_LIMIT {
        // Snap to a char boundary so multibyte text cannot split mid-char
        let mut end = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[async_trait]
impl ReasoningBackend for OpenAiBackend {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(Error::Config("OPENAI_API_KEY is not set".into()));
        }

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                status,
                body: truncate_body(&body),
            });
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        debug!(model = %self.model, "Received completion");

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::UnparsableResponse("Completion contained no choices".into()))
    }

    async fn health_check(&self) -> bool {
        let Ok(resp) = self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        else {
            return false;
        };
        resp.status().is_success()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_new() {
        let backend = OpenAiBackend::new("http://localhost:8000", "gpt-4o-mini", "sk-test");
        assert_eq!(backend.model(), "gpt-4o-mini");
        assert_eq!(backend.host(), "http://localhost:8000");
    }

    #[test]
    fn test_backend_trims_trailing_slash() {
        let backend = OpenAiBackend::new("http://localhost:8000/", "gpt-4o-mini", "sk-test");
        assert_eq!(backend.host(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_complete_without_credential_is_config_error() {
        let backend = OpenAiBackend::new("http://localhost:8000", "gpt-4o-mini", "");
        let err = backend.complete("sys", "user").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend =
            OpenAiBackend::new("http://127.0.0.1:1", "gpt-4o-mini", "sk-test");
        assert!(!backend.health_check().await);
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["content"], "Hello");
        assert_eq!(json["max_tokens"], 1000);
        let temp = json["temperature"].as_f64().unwrap();
        assert!((temp - 0.3).abs() < 0.001);
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"confidence\": 0.9}"},
                "finish_reason": "stop"
            }]
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices.len(), 1);
        assert!(response.choices[0].message.content.contains("0.9"));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(600);
        let truncated = truncate_body(&long);
        assert!(truncated.len() < 520);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn test_truncate_body_multibyte() {
        // Cut must land on a char boundary even when the limit falls mid-char
        let long = "€".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert!(truncated.chars().all(|c| c == '€' || c == '.'));
    }
}
