//! Divvy CLI - AI-assisted bill splitting
//!
//! Usage:
//!   divvy init                Initialize database
//!   divvy seed                Seed demo data
//!   divvy suggest TX_ID       Suggest a split for a transaction
//!   divvy serve --port 3000   Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Seed => commands::cmd_seed(&cli.db),
        Commands::Groups => commands::cmd_groups(&cli.db),
        Commands::Transactions { limit } => commands::cmd_transactions(&cli.db, limit),
        Commands::Suggest { id, json } => commands::cmd_suggest(&cli.db, &id, json).await,
        Commands::Serve {
            port,
            host,
            cors_origins,
        } => commands::cmd_serve(&cli.db, &host, port, cors_origins).await,
        Commands::Status => commands::cmd_status(&cli.db).await,
    }
}
