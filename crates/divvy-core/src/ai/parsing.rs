//! Response parsing and validation
//!
//! Model completions often arrive wrapped in prose despite explicit
//! formatting instructions. Parsing is therefore two-stage: strict JSON
//! first, then the largest brace-delimited substring. Both failing yields
//! [`Error::UnparsableResponse`], which the engine turns into the fallback
//! path - a parse failure is never surfaced to the caller.
//!
//! Validation resolves the model's group references back to real candidate
//! groups (opaque id first, display name second, first candidate as the
//! last resort), drops member ids the candidate roster does not know, and
//! reconciles the amounts map against the transaction total.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fallback::equal_split;
use crate::models::{
    ExpenseGroup, GroupSuggestion, ParticipantSuggestion, SplitSuggestion, SplitType, Transaction,
};

/// Model-shaped group reference: a bare name or an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GroupRef {
    Name(String),
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

/// One group suggestion as the model emits it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGroupSuggestion {
    #[serde(default)]
    group_id: Option<String>,
    #[serde(default, alias = "group", alias = "groupName")]
    group_ref: Option<GroupRef>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    matching_factors: Vec<String>,
}

/// One participant suggestion as the model emits it
#[derive(Debug, Deserialize)]
struct RawParticipant {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reason: String,
}

/// The whole suggestion body as the model emits it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSuggestion {
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    split_type: Option<SplitType>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    group_suggestions: Vec<RawGroupSuggestion>,
    #[serde(default)]
    suggested_participants: Vec<RawParticipant>,
    #[serde(default)]
    amounts: BTreeMap<String, f64>,
    #[serde(default)]
    categories: Vec<String>,
}

fn truncate(s: &str) -> String {
    if s.len() > 200 {
        // Snap to a char boundary so multibyte text cannot split mid-char
        let mut end = 200;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    } else {
        s.to_string()
    }
}

/// Extract a JSON object from the completion: the whole trimmed text if it
/// parses, otherwise the largest brace-delimited substring.
fn extract_json(response: &str) -> Result<RawSuggestion> {
    let response = response.trim();

    if let Ok(parsed) = serde_json::from_str::<RawSuggestion>(response) {
        return Ok(parsed);
    }

    let start = response.find('{');
    let end = response.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|err| {
                Error::UnparsableResponse(format!(
                    "Invalid suggestion JSON: {} | Raw: {}",
                    err,
                    truncate(json_str)
                ))
            })
        }
        _ => Err(Error::UnparsableResponse(format!(
            "No JSON found in completion | Raw: {}",
            truncate(response)
        ))),
    }
}

fn clamp_confidence(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Resolve a model group reference to a real candidate.
///
/// Opaque id first (the prompt asks the model to echo it), then exact
/// display-name match, then the first candidate. The silent default keeps a
/// sloppy response usable instead of failing the request.
fn resolve_group<'a>(
    raw: &RawGroupSuggestion,
    groups: &'a [ExpenseGroup],
    by_id: &HashMap<&str, &'a ExpenseGroup>,
    by_name: &HashMap<&str, &'a ExpenseGroup>,
) -> &'a ExpenseGroup {
    let id = raw.group_id.as_deref().or(match raw.group_ref {
        Some(GroupRef::Object { ref id, .. }) => id.as_deref(),
        _ => None,
    });
    if let Some(group) = id.and_then(|i| by_id.get(i).copied()) {
        return group;
    }

    let name = match raw.group_ref {
        Some(GroupRef::Name(ref n)) => Some(n.as_str()),
        Some(GroupRef::Object { ref name, .. }) => name.as_deref(),
        None => None,
    };
    if let Some(group) = name.and_then(|n| by_name.get(n).copied()) {
        return group;
    }

    debug!(
        group_id = ?id,
        group_name = ?name,
        "Unresolvable group reference, defaulting to first candidate"
    );
    &groups[0]
}

/// Repair the amounts map so it sums exactly to `total` (absolute dollars).
///
/// Any residual is applied to the first participant in `order` - the
/// observed app behavior. Values are snapped to cents first so model float
/// noise does not accumulate.
pub fn reconcile_amounts(amounts: &mut BTreeMap<String, f64>, order: &[String], total: f64) {
    if amounts.is_empty() {
        return;
    }

    for value in amounts.values_mut() {
        *value = (*value * 100.0).round() / 100.0;
    }

    let total_cents = (total * 100.0).round() as i64;
    let sum_cents: i64 = amounts.values().map(|v| (*v * 100.0).round() as i64).sum();
    let residual = total_cents - sum_cents;
    if residual == 0 {
        return;
    }

    let first_key = order
        .iter()
        .find(|id| amounts.contains_key(*id))
        .cloned()
        .or_else(|| amounts.keys().next().cloned());

    if let Some(key) = first_key {
        if let Some(value) = amounts.get_mut(&key) {
            let adjusted_cents = (*value * 100.0).round() as i64 + residual;
            *value = adjusted_cents as f64 / 100.0;
            debug!(
                member = %key,
                residual_cents = residual,
                "Reconciled split amounts against transaction total"
            );
        }
    }
}

/// Parse and validate a completion into a [`SplitSuggestion`].
///
/// Precondition: `groups` is non-empty.
pub fn parse_suggestion(
    response: &str,
    tx: &Transaction,
    groups: &[ExpenseGroup],
) -> Result<SplitSuggestion> {
    let raw = extract_json(response)?;

    let by_id: HashMap<&str, &ExpenseGroup> =
        groups.iter().map(|g| (g.id.as_str(), g)).collect();
    let by_name: HashMap<&str, &ExpenseGroup> =
        groups.iter().map(|g| (g.name.as_str(), g)).collect();

    // Resolve every group suggestion; synthesize one when the model sent none
    let mut group_suggestions: Vec<GroupSuggestion> = raw
        .group_suggestions
        .iter()
        .map(|rgs| GroupSuggestion {
            group: resolve_group(rgs, groups, &by_id, &by_name).clone(),
            confidence: clamp_confidence(rgs.confidence),
            reasoning: rgs.reasoning.clone(),
            matching_factors: rgs.matching_factors.clone(),
        })
        .collect();
    if group_suggestions.is_empty() {
        group_suggestions.push(GroupSuggestion {
            group: groups[0].clone(),
            confidence: clamp_confidence(raw.confidence),
            reasoning: raw.reasoning.clone(),
            matching_factors: Vec::new(),
        });
    }
    group_suggestions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let matched_group = group_suggestions[0].group.clone();

    // Member ids the candidate roster actually knows
    let known_members: HashMap<&str, &crate::models::Member> = groups
        .iter()
        .flat_map(|g| g.members.iter())
        .map(|m| (m.id.as_str(), m))
        .collect();

    let mut dropped: HashSet<String> = HashSet::new();
    let suggested_participants: Vec<ParticipantSuggestion> = raw
        .suggested_participants
        .iter()
        .filter_map(|p| match known_members.get(p.id.as_str()) {
            Some(member) => Some(ParticipantSuggestion {
                id: p.id.clone(),
                name: if p.name.is_empty() {
                    member.name.clone()
                } else {
                    p.name.clone()
                },
                confidence: clamp_confidence(p.confidence),
                reason: p.reason.clone(),
            }),
            None => {
                dropped.insert(p.id.clone());
                None
            }
        })
        .collect();

    let mut amounts: BTreeMap<String, f64> = raw
        .amounts
        .into_iter()
        .filter(|(id, _)| {
            let known = known_members.contains_key(id.as_str());
            if !known {
                dropped.insert(id.clone());
            }
            known
        })
        .collect();
    if !dropped.is_empty() {
        warn!(ids = ?dropped, "Dropped unknown member ids from model suggestion");
    }

    // A parseable response with no usable amounts still has to reconcile;
    // derive an equal split over the suggested participants, or the matched
    // group's roster when the model named nobody.
    if amounts.is_empty() {
        let ids: Vec<String> = if suggested_participants.is_empty() {
            matched_group.members.iter().map(|m| m.id.clone()).collect()
        } else {
            suggested_participants.iter().map(|p| p.id.clone()).collect()
        };
        amounts = equal_split(tx.amount.abs(), &ids);
    }

    let order: Vec<String> = suggested_participants.iter().map(|p| p.id.clone()).collect();
    reconcile_amounts(&mut amounts, &order, tx.amount.abs());

    let categories = if raw.categories.is_empty() {
        tx.categories.clone()
    } else {
        raw.categories
    };

    Ok(SplitSuggestion {
        confidence: clamp_confidence(raw.confidence),
        split_type: raw.split_type.unwrap_or(SplitType::Equal),
        reasoning: raw.reasoning,
        suggested_participants,
        amounts,
        matched_group,
        group_suggestions,
        categories,
    })
}
