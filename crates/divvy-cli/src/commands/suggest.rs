//! Suggestion command

use std::path::Path;

use anyhow::{bail, Result};
use divvy_core::SuggestionEngine;

use super::open_store;

pub async fn cmd_suggest(db_path: &Path, transaction_id: &str, json: bool) -> Result<()> {
    let store = open_store(db_path)?;

    let Some(tx) = store.get_transaction(transaction_id)? else {
        bail!("Transaction {} not found", transaction_id);
    };
    let groups = store.list_groups()?;
    if groups.is_empty() {
        bail!("No expense groups configured. Run 'divvy seed' first.");
    }
    let hints = store.suggestion_hints(tx.date.date_naive())?;

    let engine = SuggestionEngine::from_env();
    if !engine.has_backend() {
        println!("💡 Tip: Set OPENAI_API_KEY for AI-assisted suggestions");
    }

    let suggestion = engine.suggest(&tx, &groups, &hints).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestion)?);
        return Ok(());
    }

    println!(
        "💸 {} ({:.2}) on {}",
        tx.description,
        tx.amount,
        tx.date.format("%Y-%m-%d")
    );
    println!(
        "   Group: {} (confidence {:.2})",
        suggestion.matched_group.name, suggestion.confidence
    );
    println!("   Split: {}", suggestion.split_type);
    println!("   Why: {}", suggestion.reasoning);
    println!("   Amounts:");
    for (member_id, amount) in &suggestion.amounts {
        let name = suggestion
            .matched_group
            .members
            .iter()
            .find(|m| &m.id == member_id)
            .map(|m| m.name.as_str())
            .unwrap_or(member_id.as_str());
        println!("     {:>10.2}  {}", amount, name);
    }

    Ok(())
}
