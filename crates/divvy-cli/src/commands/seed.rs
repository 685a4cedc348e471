//! Demo data seeding

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use divvy_core::{
    normalize, ExpenseGroup, GroupCategory, MatchContext, Member, TripWindow,
};

use tracing::debug;

use super::open_store;

pub fn cmd_seed(db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;

    let members = vec![
        Member {
            id: "m-ana".into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
        },
        Member {
            id: "m-ben".into(),
            name: "Ben".into(),
            email: "ben@example.com".into(),
        },
        Member {
            id: "m-caro".into(),
            name: "Caro".into(),
            email: "caro@example.com".into(),
        },
    ];
    for member in &members {
        store.upsert_member(member)?;
    }

    let groups = vec![
        ExpenseGroup {
            id: "g-roommates".into(),
            name: "Roommates".into(),
            description: "Rent, utilities, household supplies".into(),
            category: GroupCategory::Household,
            color: "#00aa88".into(),
            members: members.clone(),
            context: MatchContext::default(),
        },
        ExpenseGroup {
            id: "g-dining".into(),
            name: "Dinner Club".into(),
            description: "Weeknight dinners out".into(),
            category: GroupCategory::Dining,
            color: "#e8590c".into(),
            members: vec![members[0].clone(), members[1].clone()],
            context: MatchContext {
                keywords: vec!["restaurant".into(), "thai".into()],
                merchants: vec!["Thai Palace".into()],
                locations: vec!["Oakland".into()],
            },
        },
        ExpenseGroup {
            id: "g-tahoe".into(),
            name: "Tahoe Trip".into(),
            description: "Ski weekend".into(),
            category: GroupCategory::Travel,
            color: "#1971c2".into(),
            members: members.clone(),
            context: MatchContext::default(),
        },
    ];
    for group in &groups {
        if store.get_group(&group.id)?.is_none() {
            store.insert_group(group)?;
        } else {
            debug!(group = %group.id, "Group already seeded, skipping");
        }
    }

    store.insert_trip(
        &TripWindow {
            name: "Tahoe ski weekend".into(),
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            locations: vec!["South Lake Tahoe".into()],
            participant_ids: members.iter().map(|m| m.id.clone()).collect(),
        },
        Some("g-tahoe"),
    )?;

    let raw_transactions = vec![
        serde_json::json!({
            "id": "tx-utility-1",
            "description": "PG&E PAYMENT",
            "merchant": "PG&E",
            "amount": -120.00,
            "categories": ["Utilities"],
            "date": "2024-04-01"
        }),
        serde_json::json!({
            "transaction_id": "tx-dinner-1",
            "name": "THAI PALACE OAKLAND",
            "merchant_name": "Thai Palace",
            "amount": "-47.85",
            "category_tags": ["Food and Drink", "Restaurants"],
            "datetime": "2024-04-02 19:30:00",
            "location": "Oakland, CA"
        }),
        serde_json::json!({
            "id": "tx-lodge-1",
            "description": "BASECAMP LODGE TAHOE",
            "amount": -380.50,
            "categories": ["Travel", "Lodging"],
            "date": "2024-03-02",
            "location": {"city": "South Lake Tahoe", "region": "CA"}
        }),
    ];
    for raw in &raw_transactions {
        store.insert_transaction(&normalize(raw)?)?;
    }

    println!("✅ Seeded {} groups and {} transactions", groups.len(), raw_transactions.len());
    println!();
    println!("Try: divvy suggest tx-dinner-1");

    Ok(())
}
