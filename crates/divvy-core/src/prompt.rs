//! Prompt composer
//!
//! Renders a transaction, the candidate groups with their matching
//! contexts, and any recency/trip hints into a single text block for the
//! reasoning provider, together with a strict output-schema instruction.
//!
//! No I/O here: given fixed inputs the output is deterministic and
//! diffable, which keeps the composer independently unit-testable.

use std::fmt::Write;

use crate::models::{ExpenseGroup, MatchContext, SuggestionHints, Transaction};

/// System instruction sent with every suggestion request
pub const SYSTEM_PROMPT: &str = "You are a bill-splitting assistant for a shared-expense app. \
Given one transaction and the user's expense groups, decide which group the \
transaction most likely belongs to, who should share it, and how much each \
participant owes. Respond with a single JSON object and no surrounding \
commentary.";

/// Output schema the model must follow. `splitType` is constrained to the
/// three values the app understands; group references use the opaque
/// `groupId` echoed back verbatim so the parser can resolve them without
/// string-matching display names.
const OUTPUT_SCHEMA: &str = r#"Respond with exactly one JSON object, no markdown fences, no prose:
{
  "confidence": <number 0.0-1.0>,
  "splitType": "equal" | "custom" | "percentage",
  "reasoning": "<one or two sentences>",
  "groupSuggestions": [
    {"groupId": "<id copied from a candidate group>", "confidence": <0.0-1.0>, "reasoning": "<why>", "matchingFactors": ["<tag>", ...]}
  ],
  "suggestedParticipants": [
    {"id": "<member id>", "name": "<member name>", "confidence": <0.0-1.0>, "reason": "<why>"}
  ],
  "amounts": {"<member id>": <dollars owed, non-negative>, ...},
  "categories": ["<tag>", ...]
}
Rules:
- groupSuggestions must be ordered best match first and only use candidate group ids.
- amounts must cover exactly the suggested participants and sum to the absolute transaction amount.
- Copy ids verbatim; never invent members or groups."#;

fn push_transaction(out: &mut String, tx: &Transaction) {
    out.push_str("Transaction:\n");
    let _ = writeln!(out, "  id: {}", tx.id);
    let _ = writeln!(out, "  description: {}", tx.description);
    let _ = writeln!(out, "  amount: {:.2} (negative = money spent)", tx.amount);
    let _ = writeln!(
        out,
        "  merchant: {}",
        tx.merchant.as_deref().unwrap_or("Unknown")
    );
    if !tx.categories.is_empty() {
        let _ = writeln!(out, "  categories: {}", tx.categories.join(" > "));
    }
    let _ = writeln!(out, "  date: {}", tx.date.format("%Y-%m-%d %H:%M"));
    if let Some(ref loc) = tx.location {
        match loc.region {
            Some(ref region) => {
                let _ = writeln!(out, "  location: {}, {}", loc.city, region);
            }
            None => {
                let _ = writeln!(out, "  location: {}", loc.city);
            }
        }
    }
}

fn push_group(out: &mut String, group: &ExpenseGroup, context: &MatchContext) {
    let _ = writeln!(out, "- id: {}", group.id);
    let _ = writeln!(out, "  name: {}", group.name);
    if !group.description.is_empty() {
        let _ = writeln!(out, "  description: {}", group.description);
    }
    let _ = writeln!(out, "  category: {}", group.category);
    let members = group
        .members
        .iter()
        .map(|m| format!("{} ({})", m.name, m.id))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "  members: {}", members);
    if !context.keywords.is_empty() {
        let _ = writeln!(out, "  keywords: {}", context.keywords.join(", "));
    }
    if !context.merchants.is_empty() {
        let _ = writeln!(out, "  known merchants: {}", context.merchants.join(", "));
    }
    if !context.locations.is_empty() {
        let _ = writeln!(out, "  known locations: {}", context.locations.join(", "));
    }
}

fn push_hints(out: &mut String, hints: &SuggestionHints) {
    if let Some(ref trip) = hints.active_trip {
        out.push_str("Active trip:\n");
        let _ = writeln!(
            out,
            "  {} from {} to {} in {}",
            trip.name,
            trip.start,
            trip.end,
            trip.locations.join(" / ")
        );
        if !trip.participant_ids.is_empty() {
            let _ = writeln!(out, "  participants: {}", trip.participant_ids.join(", "));
        }
        out.push_str(
            "  If the transaction date falls inside this trip window and the \
             location matches a trip location, strongly prefer the trip's group \
             regardless of category.\n\n",
        );
    }

    if !hints.recent_splits.is_empty() {
        out.push_str("Recent accepted splits (most recent first):\n");
        for split in hints.recent_splits.iter().take(10) {
            let _ = writeln!(
                out,
                "- {} ({}): split with {}",
                split.merchant,
                split.category,
                split.participant_ids.join(", ")
            );
        }
        out.push('\n');
    }
}

/// Compose the user prompt for one suggestion request.
///
/// `contexts` is the output of [`crate::context::build_contexts`] - every
/// group paired with a non-empty matching context.
pub fn compose(
    tx: &Transaction,
    contexts: &[(ExpenseGroup, MatchContext)],
    hints: &SuggestionHints,
) -> String {
    let mut out = String::with_capacity(2048);

    push_transaction(&mut out, tx);
    out.push('\n');

    out.push_str("Candidate expense groups:\n");
    for (group, context) in contexts {
        push_group(&mut out, group, context);
    }
    out.push('\n');

    push_hints(&mut out, hints);

    out.push_str(OUTPUT_SCHEMA);
    out
}
