//! Accepted splits and trip windows

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;

use super::{parse_datetime, Store};
use crate::error::Result;
use crate::models::{RecentSplit, SplitType, TripWindow};

/// One accepted split as stored
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSplit {
    pub id: i64,
    pub transaction_id: String,
    pub group_id: String,
    pub split_type: SplitType,
    pub amounts: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Record a user-accepted split
    pub fn record_split(
        &self,
        transaction_id: &str,
        group_id: &str,
        split_type: SplitType,
        amounts: &BTreeMap<String, f64>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO splits (transaction_id, group_id, split_type, amounts, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                transaction_id,
                group_id,
                split_type.as_str(),
                serde_json::to_string(amounts)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List accepted splits, newest first
    pub fn list_splits(&self, limit: i64) -> Result<Vec<StoredSplit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, transaction_id, group_id, split_type, amounts, created_at
            FROM splits ORDER BY created_at DESC, id DESC LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            let split_type: String = row.get(3)?;
            let amounts: String = row.get(4)?;
            let created_at: String = row.get(5)?;
            Ok(StoredSplit {
                id: row.get(0)?,
                transaction_id: row.get(1)?,
                group_id: row.get(2)?,
                split_type: split_type.parse().unwrap_or(SplitType::Equal),
                amounts: serde_json::from_str(&amounts).unwrap_or_default(),
                created_at: parse_datetime(&created_at),
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Recent accepted splits shaped as prompt hints, newest first.
    ///
    /// Joins back to the transaction for merchant and category; splits whose
    /// transaction is gone are skipped.
    pub fn recent_splits(&self, limit: i64) -> Result<Vec<RecentSplit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.amounts, t.merchant, t.description, t.categories
            FROM splits s
            JOIN transactions t ON t.id = s.transaction_id
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            let amounts: String = row.get(0)?;
            let merchant: Option<String> = row.get(1)?;
            let description: String = row.get(2)?;
            let categories: String = row.get(3)?;
            Ok((amounts, merchant, description, categories))
        })?;

        let mut splits = Vec::new();
        for row in rows {
            let (amounts, merchant, description, categories) = row?;
            let amounts: BTreeMap<String, f64> =
                serde_json::from_str(&amounts).unwrap_or_default();
            let categories: Vec<String> = serde_json::from_str(&categories).unwrap_or_default();
            splits.push(RecentSplit {
                participant_ids: amounts.into_keys().collect(),
                merchant: merchant.unwrap_or(description),
                category: categories.into_iter().next().unwrap_or_default(),
            });
        }
        Ok(splits)
    }

    /// Insert a trip window
    pub fn insert_trip(&self, trip: &TripWindow, group_id: Option<&str>) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO trips (name, group_id, start_date, end_date, locations, participant_ids)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                trip.name,
                group_id,
                trip.start.to_string(),
                trip.end.to_string(),
                serde_json::to_string(&trip.locations)?,
                serde_json::to_string(&trip.participant_ids)?,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Find the trip window containing the given date, if any.
    ///
    /// Overlapping trips pick the most recently started one.
    pub fn active_trip(&self, date: NaiveDate) -> Result<Option<TripWindow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT name, start_date, end_date, locations, participant_ids
            FROM trips
            WHERE start_date <= ? AND end_date >= ?
            ORDER BY start_date DESC
            LIMIT 1
            "#,
        )?;

        let date_str = date.to_string();
        let mut rows = stmt.query_map(params![date_str, date_str], |row| {
            let name: String = row.get(0)?;
            let start: String = row.get(1)?;
            let end: String = row.get(2)?;
            let locations: String = row.get(3)?;
            let participant_ids: String = row.get(4)?;
            Ok((name, start, end, locations, participant_ids))
        })?;

        match rows.next().transpose()? {
            Some((name, start, end, locations, participant_ids)) => {
                let start = start.parse().unwrap_or(date);
                let end = end.parse().unwrap_or(date);
                Ok(Some(TripWindow {
                    name,
                    start,
                    end,
                    locations: serde_json::from_str(&locations).unwrap_or_default(),
                    participant_ids: serde_json::from_str(&participant_ids).unwrap_or_default(),
                }))
            }
            None => Ok(None),
        }
    }

    /// Assemble the suggestion hints for one transaction date: recent splits
    /// plus any trip window covering the date
    pub fn suggestion_hints(&self, date: NaiveDate) -> Result<crate::models::SuggestionHints> {
        Ok(crate::models::SuggestionHints {
            recent_splits: self.recent_splits(10)?,
            active_trip: self.active_trip(date)?,
        })
    }
}
