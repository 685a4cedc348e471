//! API request handlers

mod groups;
mod splits;
mod suggestions;
mod transactions;

pub use groups::{create_group, get_group, list_groups};
pub use splits::record_split;
pub use suggestions::{recent_suggestions, suggest_split};
pub use transactions::{create_transaction, get_transaction, list_transactions};

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ai_configured: bool,
    pub ai_healthy: bool,
}

/// GET /api/health - service and reasoning backend status
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ai_configured = state.engine.has_backend();
    let ai_healthy = state.engine.backend_healthy().await;
    Json(HealthResponse {
        status: "ok",
        ai_configured,
        ai_healthy,
    })
}
