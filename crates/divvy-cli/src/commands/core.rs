//! Core command implementations and shared utilities

use std::path::Path;

use anyhow::{Context, Result};
use divvy_core::ai::ReasoningBackend;
use divvy_core::{ReasoningClient, Store};
use divvy_server::ServerConfig;

/// Open (creating if needed) the store at the given path
pub fn open_store(db_path: &Path) -> Result<Store> {
    let path_str = db_path.to_str().context("Database path is not UTF-8")?;
    Store::open(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_store(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Seed demo data: divvy seed");
    println!("  2. Start web UI: divvy serve");

    Ok(())
}

pub fn cmd_groups(db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;
    let groups = store.list_groups()?;

    if groups.is_empty() {
        println!("No expense groups yet. Run 'divvy seed' or POST /api/groups.");
        return Ok(());
    }

    println!("Expense groups:");
    for group in groups {
        let members = group
            .members
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {} - {} ({}): {}",
            group.id, group.name, group.category, members
        );
    }
    Ok(())
}

pub fn cmd_transactions(db_path: &Path, limit: i64) -> Result<()> {
    let store = open_store(db_path)?;
    let txs = store.list_transactions(limit)?;

    if txs.is_empty() {
        println!("No transactions yet. Run 'divvy seed' or POST /api/transactions.");
        return Ok(());
    }

    println!("Transactions (newest first):");
    for tx in txs {
        println!(
            "  {} {:>10.2}  {}  {}",
            tx.date.format("%Y-%m-%d"),
            tx.amount,
            tx.id,
            tx.description
        );
    }
    Ok(())
}

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    cors_origins: Vec<String>,
) -> Result<()> {
    let store = open_store(db_path)?;
    let config = ServerConfig {
        allowed_origins: cors_origins,
    };
    divvy_server::run_server(store, host, port, config).await
}

pub async fn cmd_status(db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;

    println!("📊 Divvy Status");
    println!("   Database: {}", store.path());
    println!("   Groups: {}", store.list_groups()?.len());
    println!("   Transactions: {}", store.list_transactions(i64::MAX)?.len());
    println!("   Accepted splits: {}", store.list_splits(i64::MAX)?.len());

    match ReasoningClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                println!(
                    "   ✅ Reasoning backend connected: {} ({})",
                    client.host(),
                    client.model()
                );
            } else {
                println!(
                    "   ⚠️  Reasoning backend configured but not responding: {}",
                    client.host()
                );
            }
        }
        None => {
            println!("   ℹ️  No reasoning backend (set OPENAI_API_KEY); fallback suggestions only");
        }
    }

    Ok(())
}
