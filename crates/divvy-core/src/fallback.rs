//! Deterministic fallback suggestion generator
//!
//! The availability guarantee of the suggestion flow: whenever the external
//! reasoning step is unreachable, errors out, or returns unusable output,
//! this module produces an equal split against the first candidate group.
//! No external calls, no failure mode.

use std::collections::BTreeMap;

use crate::models::{
    ExpenseGroup, GroupSuggestion, ParticipantSuggestion, SplitSuggestion, SplitType, Transaction,
};

/// Confidence assigned to fallback suggestions. Kept strictly below the
/// typical model-path confidence so the UI can flag low-trust output.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Split `total` (non-negative dollars) equally across `member_ids`,
/// distributing remainder cents by largest remainder so the shares always
/// sum back to the total exactly.
///
/// An empty member list yields an empty map - the full amount attributed to
/// no one; callers must handle that.
pub fn equal_split(total: f64, member_ids: &[String]) -> BTreeMap<String, f64> {
    let mut amounts = BTreeMap::new();
    if member_ids.is_empty() {
        return amounts;
    }

    let total_cents = (total * 100.0).round() as i64;
    let n = member_ids.len() as i64;
    let base = total_cents / n;
    let remainder = total_cents % n;

    for (i, id) in member_ids.iter().enumerate() {
        let cents = base + if (i as i64) < remainder { 1 } else { 0 };
        amounts.insert(id.clone(), cents as f64 / 100.0);
    }
    amounts
}

/// Produce the deterministic fallback suggestion.
///
/// Precondition: `groups` is non-empty (the engine rejects empty candidate
/// lists before any path that could reach here).
pub fn fallback_suggestion(tx: &Transaction, groups: &[ExpenseGroup]) -> SplitSuggestion {
    let group = groups[0].clone();
    let member_ids: Vec<String> = group.members.iter().map(|m| m.id.clone()).collect();
    let amounts = equal_split(tx.amount.abs(), &member_ids);

    let reasoning = format!(
        "AI analysis unavailable; applied an equal split across \"{}\"",
        group.name
    );

    let suggested_participants = group
        .members
        .iter()
        .map(|m| ParticipantSuggestion {
            id: m.id.clone(),
            name: m.name.clone(),
            confidence: FALLBACK_CONFIDENCE,
            reason: "Member of the default group".to_string(),
        })
        .collect();

    SplitSuggestion {
        confidence: FALLBACK_CONFIDENCE,
        split_type: SplitType::Equal,
        reasoning: reasoning.clone(),
        suggested_participants,
        amounts,
        matched_group: group.clone(),
        group_suggestions: vec![GroupSuggestion {
            group,
            confidence: FALLBACK_CONFIDENCE,
            reasoning,
            matching_factors: vec!["default".to_string()],
        }],
        categories: tx.categories.clone(),
    }
}
