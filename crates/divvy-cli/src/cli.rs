//! CLI argument definitions using clap
//!
//! Clap structs and enums only; command implementations live in the
//! `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Divvy - AI-assisted bill splitting for shared expenses
#[derive(Parser)]
#[command(name = "divvy")]
#[command(about = "Split suggestion engine for shared expenses", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "divvy.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Seed demo groups, members, and transactions
    Seed,

    /// List expense groups
    Groups,

    /// List transactions
    Transactions {
        /// Maximum number to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Suggest a split for one transaction
    Suggest {
        /// Transaction id
        id: String,

        /// Print the full suggestion as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,
    },

    /// Show database and backend status
    Status,
}
