//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, MAX_PAGE_LIMIT};
use divvy_core::{normalize, Transaction};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, MAX_PAGE_LIMIT)
}

/// GET /api/transactions - list transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let txs = state.store.list_transactions(clamp_limit(params.limit))?;
    Ok(Json(txs))
}

/// GET /api/transactions/:id - get one transaction
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    let tx = state
        .store
        .get_transaction(&id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    Ok(Json(tx))
}

/// POST /api/transactions - ingest a provider-shaped transaction record.
///
/// The body is normalized into canonical shape; records missing an id,
/// amount, or date are rejected with the field names.
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let tx = normalize(&raw)?;
    state.store.insert_transaction(&tx)?;
    Ok((StatusCode::CREATED, Json(tx)))
}
