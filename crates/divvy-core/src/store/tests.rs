//! Storage layer tests against an in-memory store

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};

use super::Store;
use crate::models::{
    ExpenseGroup, GroupCategory, Location, MatchContext, Member, SplitType, Transaction,
    TripWindow,
};

fn member(id: &str, name: &str) -> Member {
    Member {
        id: id.into(),
        name: name.into(),
        email: format!("{}@example.com", id),
    }
}

fn sample_group(id: &str, name: &str, members: Vec<Member>) -> ExpenseGroup {
    ExpenseGroup {
        id: id.into(),
        name: name.into(),
        description: "Test group".into(),
        category: GroupCategory::Dining,
        color: "#e8590c".into(),
        members,
        context: MatchContext {
            keywords: vec!["restaurant".into()],
            merchants: vec![],
            locations: vec![],
        },
    }
}

fn sample_tx(id: &str, amount: f64) -> Transaction {
    Transaction {
        id: id.into(),
        description: "THAI PALACE".into(),
        amount,
        merchant: Some("Thai Palace".into()),
        categories: vec!["Food and Drink".into(), "Restaurants".into()],
        date: Utc.with_ymd_and_hms(2024, 4, 2, 19, 30, 0).unwrap(),
        location: Some(Location {
            city: "Oakland".into(),
            region: Some("CA".into()),
        }),
    }
}

fn seeded_store() -> Store {
    let store = Store::in_memory().unwrap();
    let ana = member("m1", "Ana");
    let ben = member("m2", "Ben");
    store.upsert_member(&ana).unwrap();
    store.upsert_member(&ben).unwrap();
    store
        .insert_group(&sample_group("g1", "Dinner Club", vec![ana, ben]))
        .unwrap();
    store
}

#[test]
fn test_group_round_trip() {
    let store = seeded_store();

    let groups = store.list_groups().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, "g1");
    assert_eq!(groups[0].category, GroupCategory::Dining);
    assert_eq!(groups[0].members.len(), 2);
    assert_eq!(groups[0].context.keywords, vec!["restaurant".to_string()]);

    let fetched = store.get_group("g1").unwrap().unwrap();
    assert_eq!(fetched, groups[0]);
    assert!(store.get_group("missing").unwrap().is_none());
}

#[test]
fn test_member_shared_across_groups() {
    let store = seeded_store();
    let ana = member("m1", "Ana");
    store
        .insert_group(&sample_group("g2", "Tahoe Trip", vec![ana]))
        .unwrap();

    let groups = store.list_groups().unwrap();
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.members.iter().any(|m| m.id == "m1")));
}

#[test]
fn test_transaction_round_trip() {
    let store = seeded_store();
    let tx = sample_tx("tx-1", -47.85);
    store.insert_transaction(&tx).unwrap();

    let fetched = store.get_transaction("tx-1").unwrap().unwrap();
    assert_eq!(fetched, tx);

    // Duplicate insert is a no-op
    store.insert_transaction(&tx).unwrap();
    assert_eq!(store.list_transactions(10).unwrap().len(), 1);
}

#[test]
fn test_record_and_list_splits() {
    let store = seeded_store();
    store.insert_transaction(&sample_tx("tx-1", -47.85)).unwrap();

    let amounts: BTreeMap<String, f64> =
        [("m1".to_string(), 23.93), ("m2".to_string(), 23.92)]
            .into_iter()
            .collect();
    let id = store
        .record_split("tx-1", "g1", SplitType::Equal, &amounts)
        .unwrap();
    assert!(id > 0);

    let splits = store.list_splits(10).unwrap();
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].transaction_id, "tx-1");
    assert_eq!(splits[0].split_type, SplitType::Equal);
    assert_eq!(splits[0].amounts, amounts);
}

#[test]
fn test_recent_splits_shape_hints() {
    let store = seeded_store();
    store.insert_transaction(&sample_tx("tx-1", -47.85)).unwrap();
    let amounts: BTreeMap<String, f64> =
        [("m1".to_string(), 23.93), ("m2".to_string(), 23.92)]
            .into_iter()
            .collect();
    store
        .record_split("tx-1", "g1", SplitType::Equal, &amounts)
        .unwrap();

    let hints = store.recent_splits(10).unwrap();
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].merchant, "Thai Palace");
    assert_eq!(hints[0].category, "Food and Drink");
    assert_eq!(
        hints[0].participant_ids,
        vec!["m1".to_string(), "m2".to_string()]
    );
}

#[test]
fn test_active_trip_window() {
    let store = seeded_store();
    let trip = TripWindow {
        name: "Tahoe ski weekend".into(),
        start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
        locations: vec!["South Lake Tahoe".into()],
        participant_ids: vec!["m1".into(), "m2".into()],
    };
    store.insert_trip(&trip, Some("g1")).unwrap();

    let inside = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let found = store.active_trip(inside).unwrap().unwrap();
    assert_eq!(found, trip);

    let outside = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert!(store.active_trip(outside).unwrap().is_none());
}

#[test]
fn test_suggestion_hints_assembly() {
    let store = seeded_store();
    store.insert_transaction(&sample_tx("tx-1", -47.85)).unwrap();
    let amounts: BTreeMap<String, f64> = [("m1".to_string(), 47.85)].into_iter().collect();
    store
        .record_split("tx-1", "g1", SplitType::Custom, &amounts)
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
    let hints = store.suggestion_hints(date).unwrap();
    assert_eq!(hints.recent_splits.len(), 1);
    assert!(hints.active_trip.is_none());
}
