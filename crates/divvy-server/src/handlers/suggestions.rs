//! Split suggestion handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::{AppError, AppState, BATCH_CONCURRENCY, MAX_PAGE_LIMIT};
use divvy_core::{SplitSuggestion, Transaction};

/// GET /api/transactions/:id/suggest-split - suggest a split for one
/// transaction
pub async fn suggest_split(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<SplitSuggestion>, AppError> {
    let tx = state
        .store
        .get_transaction(&transaction_id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;

    let groups = state.store.list_groups()?;
    let hints = state.store.suggestion_hints(tx.date.date_naive())?;

    let suggestion = state.engine.suggest(&tx, &groups, &hints).await?;
    Ok(Json(suggestion))
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<i64>,
}

/// One entry in the batch suggestion response. Per-transaction failures are
/// carried as an error message so one bad record never sinks the batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSuggestion {
    pub transaction: Transaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<SplitSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/suggestions/recent?limit= - suggest splits for the most recent
/// transactions.
///
/// Suggestions run concurrently, bounded so a large batch cannot flood the
/// reasoning provider. Results come back in transaction order.
pub async fn recent_suggestions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<BatchSuggestion>>, AppError> {
    let limit = params.limit.unwrap_or(10).clamp(1, MAX_PAGE_LIMIT);
    let txs = state.store.list_transactions(limit)?;
    let groups = state.store.list_groups()?;
    if groups.is_empty() {
        return Err(AppError::bad_request("No expense groups configured"));
    }

    let semaphore = Arc::new(Semaphore::new(BATCH_CONCURRENCY));
    let mut set = JoinSet::new();

    for (index, tx) in txs.into_iter().enumerate() {
        let state = state.clone();
        let groups = groups.clone();
        let semaphore = semaphore.clone();
        set.spawn(async move {
            // Holds a permit for the full suggestion, including the
            // provider call
            let _permit = semaphore.acquire_owned().await.ok();

            let hints = match state.store.suggestion_hints(tx.date.date_naive()) {
                Ok(hints) => hints,
                Err(err) => {
                    warn!(tx_id = %tx.id, error = %err, "Failed to load hints");
                    Default::default()
                }
            };

            let entry = match state.engine.suggest(&tx, &groups, &hints).await {
                Ok(suggestion) => BatchSuggestion {
                    transaction: tx,
                    suggestion: Some(suggestion),
                    error: None,
                },
                Err(err) => {
                    warn!(tx_id = %tx.id, error = %err, "Suggestion failed");
                    BatchSuggestion {
                        transaction: tx,
                        suggestion: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            (index, entry)
        });
    }

    let mut results: Vec<(usize, BatchSuggestion)> = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(entry) => results.push(entry),
            Err(err) => warn!(error = %err, "Suggestion task panicked"),
        }
    }
    results.sort_by_key(|(index, _)| *index);

    Ok(Json(results.into_iter().map(|(_, entry)| entry).collect()))
}
