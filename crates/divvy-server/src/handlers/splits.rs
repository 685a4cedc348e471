//! Accepted split handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use divvy_core::SplitType;

/// Request body for recording an accepted split
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSplitRequest {
    pub group_id: String,
    #[serde(default = "default_split_type")]
    pub split_type: SplitType,
    pub amounts: BTreeMap<String, f64>,
}

fn default_split_type() -> SplitType {
    SplitType::Equal
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSplitResponse {
    pub id: i64,
    pub transaction_id: String,
}

/// POST /api/transactions/:id/splits - record a user-accepted split.
///
/// The amounts must cover the absolute transaction total within one cent;
/// anything else is a client error, not something to silently repair.
pub async fn record_split(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
    Json(body): Json<RecordSplitRequest>,
) -> Result<(StatusCode, Json<RecordSplitResponse>), AppError> {
    let tx = state
        .store
        .get_transaction(&transaction_id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;

    let group = state
        .store
        .get_group(&body.group_id)?
        .ok_or_else(|| AppError::not_found("Group not found"))?;

    if body.amounts.is_empty() {
        return Err(AppError::bad_request("Split amounts are required"));
    }
    for (member_id, amount) in &body.amounts {
        if !group.members.iter().any(|m| &m.id == member_id) {
            return Err(AppError::bad_request(&format!(
                "Member {} is not in group {}",
                member_id, group.id
            )));
        }
        if *amount < 0.0 {
            return Err(AppError::bad_request("Split amounts must be non-negative"));
        }
    }

    let total: f64 = body.amounts.values().sum();
    if (total - tx.amount.abs()).abs() > 0.01 {
        return Err(AppError::bad_request(&format!(
            "Split amounts sum to {:.2}, expected {:.2}",
            total,
            tx.amount.abs()
        )));
    }

    let id = state
        .store
        .record_split(&tx.id, &group.id, body.split_type, &body.amounts)?;

    Ok((
        StatusCode::CREATED,
        Json(RecordSplitResponse {
            id,
            transaction_id: tx.id,
        }),
    ))
}
