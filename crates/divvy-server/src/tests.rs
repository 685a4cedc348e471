//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use divvy_core::{MockBackend, ReasoningClient, Store, SuggestionEngine};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn seeded_store() -> Store {
    let store = Store::in_memory().unwrap();

    let ana = divvy_core::Member {
        id: "m1".into(),
        name: "Ana".into(),
        email: "ana@example.com".into(),
    };
    let ben = divvy_core::Member {
        id: "m2".into(),
        name: "Ben".into(),
        email: "ben@example.com".into(),
    };
    store.upsert_member(&ana).unwrap();
    store.upsert_member(&ben).unwrap();
    store
        .insert_group(&divvy_core::ExpenseGroup {
            id: "g1".into(),
            name: "Roommates".into(),
            description: "Shared apartment costs".into(),
            category: divvy_core::GroupCategory::Household,
            color: "#00aa88".into(),
            members: vec![ana, ben],
            context: Default::default(),
        })
        .unwrap();

    let raw = serde_json::json!({
        "id": "tx-1",
        "description": "PG&E PAYMENT",
        "merchant": "PG&E",
        "amount": -120.00,
        "categories": ["Utilities"],
        "date": "2024-04-02"
    });
    store
        .insert_transaction(&divvy_core::normalize(&raw).unwrap())
        .unwrap();

    store
}

/// App with no reasoning backend: every suggestion is the fallback
fn fallback_app(store: Store) -> Router {
    create_router_with_engine(store, ServerConfig::default(), SuggestionEngine::new(None))
}

fn mock_app(store: Store, completion: &str) -> Router {
    let engine = SuggestionEngine::new(Some(ReasoningClient::Mock(MockBackend::with_response(
        completion,
    ))));
    create_router_with_engine(store, ServerConfig::default(), engine)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

// ========== Health ==========

#[tokio::test]
async fn test_health() {
    let app = fallback_app(seeded_store());

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["ai_configured"], false);
    assert_eq!(json["ai_healthy"], false);
}

// ========== Groups ==========

#[tokio::test]
async fn test_list_groups() {
    let app = fallback_app(seeded_store());

    let response = app.oneshot(get("/api/groups")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let groups = json.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["id"], "g1");
    assert_eq!(groups[0]["members"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_group_not_found() {
    let app = fallback_app(seeded_store());

    let response = app.oneshot(get("/api/groups/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_group() {
    let app = fallback_app(seeded_store());

    let body = serde_json::json!({
        "id": "g2",
        "name": "Tahoe Trip",
        "category": "travel",
        "members": [
            {"id": "m1", "name": "Ana", "email": "ana@example.com"},
            {"id": "m3", "name": "Caro", "email": "caro@example.com"}
        ]
    });

    let response = app.oneshot(post_json("/api/groups", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = get_body_json(response).await;
    assert_eq!(json["id"], "g2");
    assert_eq!(json["category"], "travel");
}

#[tokio::test]
async fn test_create_group_duplicate_id_conflicts() {
    let app = fallback_app(seeded_store());

    let body = serde_json::json!({"id": "g1", "name": "Duplicate", "members": []});
    let response = app.oneshot(post_json("/api/groups", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ========== Transactions ==========

#[tokio::test]
async fn test_create_transaction_normalizes_aliases() {
    let app = fallback_app(seeded_store());

    let body = serde_json::json!({
        "transaction_id": "tx-2",
        "name": "THAI PALACE OAKLAND",
        "merchant_name": "Thai Palace",
        "amount": "-47.85",
        "datetime": "2024-04-03 19:30:00",
        "location": "Oakland, CA"
    });

    let response = app
        .oneshot(post_json("/api/transactions", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = get_body_json(response).await;
    assert_eq!(json["id"], "tx-2");
    assert_eq!(json["amount"], -47.85);
    assert_eq!(json["merchant"], "Thai Palace");
    assert_eq!(json["location"]["city"], "Oakland");
}

#[tokio::test]
async fn test_create_transaction_missing_fields_is_bad_request() {
    let app = fallback_app(seeded_store());

    let body = serde_json::json!({"description": "no id, amount, or date"});
    let response = app
        .oneshot(post_json("/api/transactions", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("id"));
    assert!(message.contains("amount"));
    assert!(message.contains("date"));
}

#[tokio::test]
async fn test_get_transaction() {
    let app = fallback_app(seeded_store());

    let response = app.oneshot(get("/api/transactions/tx-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["id"], "tx-1");
    assert_eq!(json["amount"], -120.00);
}

// ========== Suggestions ==========

#[tokio::test]
async fn test_suggest_split_fallback() {
    let app = fallback_app(seeded_store());

    let response = app
        .oneshot(get("/api/transactions/tx-1/suggest-split"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["confidence"], 0.5);
    assert_eq!(json["splitType"], "equal");
    assert_eq!(json["matchedGroup"]["id"], "g1");
    assert_eq!(json["amounts"]["m1"], 60.00);
    assert_eq!(json["amounts"]["m2"], 60.00);
}

#[tokio::test]
async fn test_suggest_split_with_mock_backend() {
    let completion = r#"{
        "confidence": 0.93,
        "splitType": "equal",
        "reasoning": "Shared utility bill",
        "groupSuggestions": [{"groupId": "g1", "confidence": 0.93, "reasoning": "household", "matchingFactors": ["category"]}],
        "suggestedParticipants": [
            {"id": "m1", "name": "Ana", "confidence": 0.9, "reason": "roommate"},
            {"id": "m2", "name": "Ben", "confidence": 0.9, "reason": "roommate"}
        ],
        "amounts": {"m1": 60.00, "m2": 60.00}
    }"#;
    let app = mock_app(seeded_store(), completion);

    let response = app
        .oneshot(get("/api/transactions/tx-1/suggest-split"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["confidence"], 0.93);
    assert_eq!(json["reasoning"], "Shared utility bill");
    assert_eq!(json["suggestedParticipants"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_suggest_split_no_groups_is_bad_request() {
    let store = Store::in_memory().unwrap();
    let raw = serde_json::json!({
        "id": "tx-1", "description": "X", "amount": -10.0, "date": "2024-04-02"
    });
    store
        .insert_transaction(&divvy_core::normalize(&raw).unwrap())
        .unwrap();
    let app = fallback_app(store);

    let response = app
        .oneshot(get("/api/transactions/tx-1/suggest-split"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_suggest_split_unknown_transaction() {
    let app = fallback_app(seeded_store());

    let response = app
        .oneshot(get("/api/transactions/missing/suggest-split"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recent_suggestions_batch() {
    let store = seeded_store();
    // Second transaction so the batch has more than one entry
    let raw = serde_json::json!({
        "id": "tx-2", "description": "SAFEWAY", "amount": -86.40, "date": "2024-04-05"
    });
    store
        .insert_transaction(&divvy_core::normalize(&raw).unwrap())
        .unwrap();
    let app = fallback_app(store);

    let response = app
        .oneshot(get("/api/suggestions/recent?limit=10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    // Newest first, matching list_transactions order
    assert_eq!(entries[0]["transaction"]["id"], "tx-2");
    assert_eq!(entries[1]["transaction"]["id"], "tx-1");
    for entry in entries {
        assert!(entry.get("suggestion").is_some());
        assert!(entry.get("error").is_none());
    }
}

// ========== Accepted splits ==========

#[tokio::test]
async fn test_record_split() {
    let app = fallback_app(seeded_store());

    let body = serde_json::json!({
        "groupId": "g1",
        "splitType": "equal",
        "amounts": {"m1": 60.00, "m2": 60.00}
    });

    let response = app
        .oneshot(post_json("/api/transactions/tx-1/splits", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = get_body_json(response).await;
    assert_eq!(json["transactionId"], "tx-1");
    assert!(json["id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_record_split_sum_mismatch_is_bad_request() {
    let app = fallback_app(seeded_store());

    let body = serde_json::json!({
        "groupId": "g1",
        "amounts": {"m1": 60.00, "m2": 50.00}
    });

    let response = app
        .oneshot(post_json("/api/transactions/tx-1/splits", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_record_split_unknown_member_is_bad_request() {
    let app = fallback_app(seeded_store());

    let body = serde_json::json!({
        "groupId": "g1",
        "amounts": {"m1": 60.00, "m-ghost": 60.00}
    });

    let response = app
        .oneshot(post_json("/api/transactions/tx-1/splits", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
