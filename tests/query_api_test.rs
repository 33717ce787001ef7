// Integration tests for the building query API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use landmark::api::{create_query_router, create_ws_router, QueryAppState, WsAppState};
use landmark::state::EntityStore;
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_app(store: Arc<EntityStore>) -> Router {
    create_query_router(Arc::new(QueryAppState { store }))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn seeded_store() -> Arc<EntityStore> {
    let store = Arc::new(EntityStore::new());
    store.ingest_message("dom/bldg/6/coord", b"[30.28, -97.74]");
    store.ingest_message("dom/bldg/6/color", b"[255, 0, 0]");
    store.ingest_message("dom/bldg/6/name", b"Gregory Gym");
    store.ingest_message("dom/bldg/6/teams", br#"{"Red": 10}"#);
    store.ingest_message("dom/bldg/7/color", b"[1, 2, 3]");
    store.ingest_message("dom/bldg/teams", br#"{"Red": 10, "Blue": 12}"#);
    store
}

/// GET /api/buildings returns only located buildings, index aligned.
#[tokio::test]
async fn test_list_buildings() {
    let (status, json) = get_json(create_test_app(seeded_store()), "/api/buildings").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ids"], serde_json::json!(["6"]));
    assert_eq!(json["coordinates"], serde_json::json!([[30.28, -97.74]]));
    assert_eq!(json["colors"], serde_json::json!(["#ff0000"]));
    assert_eq!(json["names"], serde_json::json!(["Gregory Gym"]));
    assert_eq!(json["teams"], serde_json::json!([{"Red": 10.0}]));
    assert_eq!(json["users"], serde_json::json!([{}]));
    assert_eq!(json["totals"]["Blue"], 12.0);
}

/// ?lng_lat=true flips the coordinate pairs.
#[tokio::test]
async fn test_list_buildings_lng_lat() {
    let (status, json) =
        get_json(create_test_app(seeded_store()), "/api/buildings?lng_lat=true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["coordinates"], serde_json::json!([[-97.74, 30.28]]));
}

/// Buildings without a location are still reachable by id.
#[tokio::test]
async fn test_get_building_without_location() {
    let (status, json) = get_json(create_test_app(seeded_store()), "/api/buildings/7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "7");
    assert!(json["location"].is_null());
    assert_eq!(json["color"], serde_json::json!({"r": 1, "g": 2, "b": 3}));
}

#[tokio::test]
async fn test_get_building_not_found() {
    let (status, json) = get_json(create_test_app(seeded_store()), "/api/buildings/99").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Building not found");
}

/// The totals topic never shows up as a building.
#[tokio::test]
async fn test_totals_not_a_building() {
    let (status, _) = get_json(create_test_app(seeded_store()), "/api/buildings/teams").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = get_json(create_test_app(seeded_store()), "/api/totals").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ranked"][0]["name"], "Blue");
    assert_eq!(json["ranked"][1]["name"], "Red");
}

/// Plain GET without upgrade headers is refused by the WebSocket route.
#[tokio::test]
async fn test_ws_requires_upgrade() {
    let app = create_ws_router(Arc::new(WsAppState {
        store: seeded_store(),
    }));

    let response = app
        .oneshot(Request::builder().uri("/api/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
