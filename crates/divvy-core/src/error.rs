//! Error types for Divvy

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No candidate groups available")]
    NoGroups,

    #[error("Reasoning backend not configured: {0}")]
    Config(String),

    #[error("Reasoning provider error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Unparsable reasoning response: {0}")]
    UnparsableResponse(String),
}

impl Error {
    /// Whether this failure should degrade to the deterministic fallback
    /// instead of surfacing to the caller.
    ///
    /// Input problems (malformed transaction, empty group list) are the only
    /// hard failures; everything on the provider side is recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::InvalidInput(_) | Error::NoGroups)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
