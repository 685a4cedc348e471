//! Transaction operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Store};
use crate::error::Result;
use crate::models::{Location, Transaction};

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let categories: String = row.get(4)?;
    let date: String = row.get(5)?;
    let city: Option<String> = row.get(6)?;
    let region: Option<String> = row.get(7)?;

    Ok(Transaction {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        merchant: row.get(3)?,
        categories: serde_json::from_str(&categories).unwrap_or_default(),
        date: parse_datetime(&date),
        location: city.map(|city| Location { city, region }),
    })
}

impl Store {
    /// Insert a transaction. Re-inserting the same id is a no-op; upstream
    /// records are immutable once fetched.
    pub fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        let conn = self.conn()?;
        let categories = serde_json::to_string(&tx.categories)?;

        conn.execute(
            r#"
            INSERT OR IGNORE INTO transactions (id, description, amount, merchant, categories, date, city, region)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.id,
                tx.description,
                tx.amount,
                tx.merchant,
                categories,
                tx.date.to_rfc3339(),
                tx.location.as_ref().map(|l| l.city.clone()),
                tx.location.as_ref().and_then(|l| l.region.clone()),
            ],
        )?;
        Ok(())
    }

    /// List transactions, newest first
    pub fn list_transactions(&self, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, description, amount, merchant, categories, date, city, region
            FROM transactions ORDER BY date DESC LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![limit], row_to_transaction)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Get one transaction by id
    pub fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        conn.query_row(
            r#"
            SELECT id, description, amount, merchant, categories, date, city, region
            FROM transactions WHERE id = ?
            "#,
            params![id],
            row_to_transaction,
        )
        .optional()
        .map_err(Into::into)
    }
}
