//! Test utilities
//!
//! A mock chat-completion server speaking just enough of the OpenAI wire
//! format for integration tests and offline development.

use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Mock chat-completion server for testing and development.
///
/// Binds an ephemeral port, answers `POST /v1/chat/completions` with a
/// scripted completion and `GET /v1/models` for health checks, and shuts
/// down on drop.
pub struct MockCompletionServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockCompletionServer {
    /// Start the mock server returning the default scripted suggestion
    pub async fn start() -> Self {
        Self::with_completion(default_completion()).await
    }

    /// Start the mock server returning the given completion text verbatim
    pub async fn with_completion(completion: String) -> Self {
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_completions))
            .with_state(completion);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockCompletionServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn default_completion() -> String {
    r#"{
        "confidence": 0.88,
        "splitType": "equal",
        "reasoning": "Scripted mock completion",
        "groupSuggestions": [
            {"groupId": "g1", "confidence": 0.88, "reasoning": "scripted", "matchingFactors": ["category"]}
        ],
        "suggestedParticipants": [],
        "amounts": {}
    }"#
    .to_string()
}

async fn handle_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        data: vec![ModelInfo {
            id: "gpt-4o-mini".to_string(),
            object: "model".to_string(),
        }],
    })
}

async fn handle_completions(
    State(completion): State<String>,
    Json(request): Json<CompletionRequest>,
) -> Json<CompletionResponse> {
    Json(CompletionResponse {
        model: request.model,
        choices: vec![Choice {
            index: 0,
            message: ResponseMessage {
                role: "assistant".to_string(),
                content: completion,
            },
            finish_reason: "stop".to_string(),
        }],
    })
}

// Just enough of the wire format for the backend under test

#[derive(Debug, Serialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    id: String,
    object: String,
}

#[derive(Debug, Deserialize)]
struct CompletionRequest {
    model: String,
    #[allow(dead_code)]
    messages: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct CompletionResponse {
    model: String,
    choices: Vec<Choice>,
}

#[derive(Debug, Serialize)]
struct Choice {
    index: u32,
    message: ResponseMessage,
    finish_reason: String,
}

#[derive(Debug, Serialize)]
struct ResponseMessage {
    role: String,
    content: String,
}
