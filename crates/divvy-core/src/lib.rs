//! Divvy Core Library
//!
//! Shared functionality for the Divvy bill-splitting assistant:
//! - Transaction normalization from provider-shaped records
//! - Group context assembly for matching signals
//! - Prompt composition for the reasoning provider
//! - Pluggable reasoning backends (OpenAI-compatible, mock)
//! - Response parsing with amount reconciliation
//! - Deterministic fallback split generation
//! - SQLite storage for groups, transactions, and accepted splits

pub mod ai;
pub mod context;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod store;

/// Test utilities including the mock chat-completion server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{MockBackend, OpenAiBackend, ReasoningBackend, ReasoningClient};
pub use engine::SuggestionEngine;
pub use error::{Error, Result};
pub use fallback::{equal_split, fallback_suggestion, FALLBACK_CONFIDENCE};
pub use models::{
    ExpenseGroup, GroupCategory, GroupSuggestion, Location, MatchContext, Member,
    ParticipantSuggestion, RecentSplit, SplitSuggestion, SplitType, SuggestionHints, Transaction,
    TripWindow,
};
pub use normalize::normalize;
pub use store::Store;
