//! Transaction normalizer
//!
//! Upstream data sources disagree on field names and shapes
//! (`merchant_name` vs `merchantName`, category as a list or a single
//! string, dates with or without a time component). This module accepts
//! whatever the aggregator returns and produces the canonical
//! [`Transaction`] the engine consumes.
//!
//! Missing optional fields (merchant, location) never fail; the request is
//! rejected only when `id`, `amount`, or `date` cannot be recovered, since
//! the reasoning step cannot proceed without them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{Location, Transaction};

/// A value that may arrive as a string or a number
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Num(f64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::Str(s) => s,
            Self::Num(n) => n.to_string(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Str(s) => s.trim().parse().ok(),
            Self::Num(n) => Some(*n),
        }
    }
}

/// Category field: single tag or ordered list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

/// Location field: structured or a "City, Region" string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLocation {
    Structured {
        city: String,
        #[serde(default, alias = "state")]
        region: Option<String>,
    },
    Flat(String),
}

impl RawLocation {
    fn into_location(self) -> Option<Location> {
        match self {
            Self::Structured { city, region } => Some(Location { city, region }),
            Self::Flat(s) => {
                let mut parts = s.splitn(2, ',').map(|p| p.trim().to_string());
                let city = parts.next().filter(|c| !c.is_empty())?;
                Some(Location {
                    city,
                    region: parts.next().filter(|r| !r.is_empty()),
                })
            }
        }
    }
}

/// An upstream transaction record, field names as the aggregator sends them
#[derive(Debug, Deserialize)]
pub struct RawTransaction {
    #[serde(default, alias = "transaction_id", alias = "transactionId")]
    id: Option<StringOrNumber>,
    #[serde(default, alias = "name")]
    description: Option<String>,
    #[serde(default)]
    amount: Option<StringOrNumber>,
    #[serde(default, alias = "merchant_name", alias = "merchantName")]
    merchant: Option<String>,
    #[serde(default, alias = "categories", alias = "category_tags")]
    category: Option<OneOrMany>,
    #[serde(default, alias = "datetime", alias = "timestamp", alias = "posted_at")]
    date: Option<String>,
    #[serde(default)]
    location: Option<RawLocation>,
}

/// Parse a date that may or may not carry a time component
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Convert a raw upstream record into the canonical [`Transaction`] shape.
///
/// Returns `Error::InvalidInput` naming the missing required fields when
/// `id`, `amount`, or `date` cannot be recovered.
pub fn normalize(value: &serde_json::Value) -> Result<Transaction> {
    let raw: RawTransaction = serde_json::from_value(value.clone())
        .map_err(|e| Error::InvalidInput(format!("Unrecognized transaction shape: {}", e)))?;
    normalize_raw(raw)
}

fn normalize_raw(raw: RawTransaction) -> Result<Transaction> {
    let mut missing = Vec::new();

    let id = match raw.id {
        Some(v) => {
            let s = v.into_string();
            if s.trim().is_empty() {
                missing.push("id");
                String::new()
            } else {
                s
            }
        }
        None => {
            missing.push("id");
            String::new()
        }
    };

    let amount = match raw.amount.as_ref().and_then(StringOrNumber::as_f64) {
        Some(a) => a,
        None => {
            missing.push("amount");
            0.0
        }
    };

    let date = match raw.date.as_deref().and_then(parse_date) {
        Some(d) => d,
        None => {
            missing.push("date");
            Utc::now()
        }
    };

    if !missing.is_empty() {
        return Err(Error::InvalidInput(format!(
            "Transaction missing required field(s): {}",
            missing.join(", ")
        )));
    }

    let merchant = raw
        .merchant
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    let description = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .or_else(|| merchant.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(Transaction {
        id,
        description,
        amount,
        merchant,
        categories: raw.category.map(OneOrMany::into_vec).unwrap_or_default(),
        date,
        location: raw.location.and_then(RawLocation::into_location),
    })
}
