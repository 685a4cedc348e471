//! Suggestion engine
//!
//! Orchestrates one suggestion request end to end: context build, prompt
//! composition, the external reasoning call, parse/validation, and the
//! deterministic fallback. The engine never fails because the provider
//! did: any recoverable error downgrades to the fallback suggestion.
//!
//! The only errors callers see are input errors, chiefly
//! [`Error::NoGroups`] when there is no candidate group to suggest against.

use tracing::{debug, info, warn};

use crate::ai::parsing::parse_suggestion;
use crate::ai::{ReasoningBackend, ReasoningClient};
use crate::context::build_contexts;
use crate::error::Result;
use crate::fallback::fallback_suggestion;
use crate::models::{ExpenseGroup, SplitSuggestion, SuggestionHints, Transaction};
use crate::normalize::normalize;
use crate::prompt::{compose, SYSTEM_PROMPT};

/// Stateless suggestion pipeline.
///
/// Cheap to clone; each call is independent, so one engine can serve
/// concurrent requests without locking.
#[derive(Clone)]
pub struct SuggestionEngine {
    ai: Option<ReasoningClient>,
}

impl SuggestionEngine {
    /// Create an engine with an explicit reasoning client, or none for
    /// fallback-only operation
    pub fn new(ai: Option<ReasoningClient>) -> Self {
        Self { ai }
    }

    /// Create from environment variables. Without a configured provider the
    /// engine still works, serving fallback suggestions only.
    pub fn from_env() -> Self {
        let ai = ReasoningClient::from_env();
        match ai {
            Some(ref client) => {
                info!(model = %client.model(), host = %client.host(), "Reasoning backend configured");
            }
            None => {
                warn!("No reasoning backend configured, serving fallback suggestions only");
            }
        }
        Self { ai }
    }

    /// Whether a reasoning backend is configured
    pub fn has_backend(&self) -> bool {
        self.ai.is_some()
    }

    /// Check whether the configured backend is reachable
    pub async fn backend_healthy(&self) -> bool {
        match self.ai {
            Some(ref client) => client.health_check().await,
            None => false,
        }
    }

    /// Suggest a split for a canonical transaction.
    ///
    /// Errors only on bad input (`NoGroups`); provider failures and
    /// unusable completions fall back to the deterministic equal split.
    pub async fn suggest(
        &self,
        tx: &Transaction,
        groups: &[ExpenseGroup],
        hints: &SuggestionHints,
    ) -> Result<SplitSuggestion> {
        let contexts = build_contexts(groups)?;

        let Some(ref client) = self.ai else {
            debug!(tx_id = %tx.id, "No backend, using fallback");
            return Ok(fallback_suggestion(tx, groups));
        };

        let prompt = compose(tx, &contexts, hints);
        debug!(tx_id = %tx.id, prompt_len = prompt.len(), "Requesting split suggestion");

        let completion = match client.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => text,
            Err(err) if err.is_recoverable() => {
                warn!(tx_id = %tx.id, error = %err, "Reasoning call failed, using fallback");
                return Ok(fallback_suggestion(tx, groups));
            }
            Err(err) => return Err(err),
        };

        match parse_suggestion(&completion, tx, groups) {
            Ok(suggestion) => {
                info!(
                    tx_id = %tx.id,
                    group = %suggestion.matched_group.name,
                    confidence = suggestion.confidence,
                    "Suggestion produced"
                );
                Ok(suggestion)
            }
            Err(err) if err.is_recoverable() => {
                warn!(tx_id = %tx.id, error = %err, "Unusable completion, using fallback");
                Ok(fallback_suggestion(tx, groups))
            }
            Err(err) => Err(err),
        }
    }

    /// Suggest a split for a raw provider-shaped transaction record.
    ///
    /// Normalization errors are input errors and propagate; everything past
    /// normalization behaves like [`suggest`](Self::suggest).
    pub async fn suggest_raw(
        &self,
        raw: &serde_json::Value,
        groups: &[ExpenseGroup],
        hints: &SuggestionHints,
    ) -> Result<SplitSuggestion> {
        let tx = normalize(raw)?;
        self.suggest(&tx, groups, hints).await
    }
}
