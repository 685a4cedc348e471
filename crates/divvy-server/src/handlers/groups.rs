//! Expense group handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{AppError, AppState};
use divvy_core::ExpenseGroup;

/// GET /api/groups - list all groups with member rosters
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ExpenseGroup>>, AppError> {
    let groups = state.store.list_groups()?;
    Ok(Json(groups))
}

/// GET /api/groups/:id - get one group
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ExpenseGroup>, AppError> {
    let group = state
        .store
        .get_group(&id)?
        .ok_or_else(|| AppError::not_found("Group not found"))?;
    Ok(Json(group))
}

/// POST /api/groups - create a group with its member roster.
///
/// Members are upserted first so a roster can reuse people from other
/// groups.
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(group): Json<ExpenseGroup>,
) -> Result<(StatusCode, Json<ExpenseGroup>), AppError> {
    if group.id.is_empty() || group.name.is_empty() {
        return Err(AppError::bad_request("Group id and name are required"));
    }
    if state.store.get_group(&group.id)?.is_some() {
        return Err(AppError::conflict("Group id already exists"));
    }

    for member in &group.members {
        if member.id.is_empty() {
            return Err(AppError::bad_request("Member id is required"));
        }
        state.store.upsert_member(member)?;
    }
    state.store.insert_group(&group)?;

    Ok((StatusCode::CREATED, Json(group)))
}
