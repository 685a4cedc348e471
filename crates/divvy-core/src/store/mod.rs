//! Storage layer with connection pooling and migrations
//!
//! Organized by domain:
//! - `groups` - expense groups and their member rosters
//! - `transactions` - canonical transaction records
//! - `splits` - accepted splits and trip windows
//!
//! JSON-valued columns (matching context, category tags, amounts) are stored
//! as serialized text; everything queried on gets its own column.

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;

mod groups;
mod splits;
mod transactions;
#[cfg(test)]
mod tests;

pub use splits::StoredSplit;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a stored datetime string into a DateTime<Utc>.
///
/// Accepts RFC 3339 (how we write) and the bare SQLite format (how
/// CURRENT_TIMESTAMP writes).
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

/// Store wrapper with connection pooling
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
    db_path: String,
}

impl Store {
    /// Open (creating if needed) a store at the given path
    pub fn open(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let store = Self {
            pool,
            db_path: path.to_string(),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// Uses a unique temp file rather than `:memory:` so every pooled
    /// connection sees the same database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "/tmp/divvy_test_{}_{}.db",
            std::process::id(),
            id
        );
        let _ = std::fs::remove_file(&path);

        Self::open(&path)
    }

    /// Path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- People who share costs; global, not scoped to a group
            CREATE TABLE IF NOT EXISTS members (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL DEFAULT ''
            );

            -- Expense groups; context is the JSON matching signal
            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT 'other',
                color TEXT NOT NULL DEFAULT '',
                context TEXT NOT NULL DEFAULT '{}',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS group_members (
                group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
                member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
                PRIMARY KEY (group_id, member_id)
            );

            -- Canonical transactions; categories is a JSON array of tags
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                merchant TEXT,
                categories TEXT NOT NULL DEFAULT '[]',
                date TEXT NOT NULL,
                city TEXT,
                region TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

            -- Trip windows used as suggestion hints
            CREATE TABLE IF NOT EXISTS trips (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                group_id TEXT REFERENCES groups(id),
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                locations TEXT NOT NULL DEFAULT '[]',
                participant_ids TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX IF NOT EXISTS idx_trips_window ON trips(start_date, end_date);

            -- Accepted splits; amounts is a JSON member-id -> dollars map
            CREATE TABLE IF NOT EXISTS splits (
                id INTEGER PRIMARY KEY,
                transaction_id TEXT NOT NULL REFERENCES transactions(id),
                group_id TEXT NOT NULL REFERENCES groups(id),
                split_type TEXT NOT NULL DEFAULT 'equal',
                amounts TEXT NOT NULL DEFAULT '{}',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_splits_created ON splits(created_at);
            "#,
        )?;

        Ok(())
    }
}
