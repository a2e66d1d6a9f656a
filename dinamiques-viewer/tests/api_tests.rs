//! Integration tests for dinamiques-viewer API endpoints
//!
//! Every test builds the router over an in-memory source and favorites
//! store, so no files or network are involved.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use dinamiques_common::favorites::{KeyValueStore, MemoryKeyValueStore, FAVORITES_KEY};
use dinamiques_common::source::MemorySource;
use dinamiques_common::{Catalog, Dynamic, QualityScale};
use dinamiques_viewer::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot` method

const SEARCH_QUIET: Duration = Duration::from_millis(20);

fn sample() -> Vec<Dynamic> {
    serde_json::from_value(json!([
        {
            "id": 1, "titol": "Roda de noms", "temps_total": 30, "qualitat": 8,
            "target": ["TIS"], "model": "gpt", "tipus_dinamica": "joc",
            "json_complet": { "connexio_curricular": { "unitats_formatives": [{
                "codi": "MP09", "nom": "Habilitats socials",
                "resultats_aprenentatge": [{ "codi": "RA1", "criteris_avaluacio": ["CA1.a"] }]
            }]}}
        },
        {
            "id": 2, "titol": "Debat obert", "temps_total": 90, "qualitat": 6,
            "target": ["TAPD"], "model": "claude", "tipus_dinamica": "debat",
            "json_complet": { "connexio_curricular": {
                "modul_codi": "MP02", "modul": "Atenció sanitària", "ra": "RA3"
            }}
        },
        { "id": 3, "titol": "Teranyina", "temps_total": 20, "target": ["TIS"], "model": "claude", "tipus_dinamica": "joc" },
        { "id": 4, "titol": "Mirall", "temps_total": 45, "target": ["TAPD"], "model": "claude" }
    ]))
    .unwrap()
}

struct TestApp {
    router: axum::Router,
    store: Arc<MemoryKeyValueStore>,
}

/// Test helper: app with the sample loaded and a page size of 2
fn setup_app() -> TestApp {
    let records = sample();
    let catalog = Catalog::with_records(records.clone(), 2, QualityScale::TenPoint);
    let store = Arc::new(MemoryKeyValueStore::new());
    let state = AppState::new(
        catalog,
        Arc::new(MemorySource::new(records)),
        store.clone(),
        3,
        SEARCH_QUIET,
    );
    TestApp {
        router: build_router(state),
        store,
    }
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn call(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

fn ids(records: &Value) -> Vec<i64> {
    records
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app();
    let (status, body) = call(&app.router, test_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "dinamiques-viewer");
    assert!(body["version"].is_string());
}

// =============================================================================
// Listing and detail
// =============================================================================

#[tokio::test]
async fn test_listing_total_counts_before_cap() {
    let app = setup_app();
    let (status, body) = call(&app.router, test_request("GET", "/api/dinamiques")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    // capped at result_cap = 3, newest first
    assert_eq!(ids(&body["dinamiques"]), vec![4, 3, 2]);
}

#[tokio::test]
async fn test_listing_server_side_filters() {
    let app = setup_app();
    let (_, body) = call(&app.router, test_request("GET", "/api/dinamiques?target=TIS&model=claude")).await;
    assert_eq!(ids(&body["dinamiques"]), vec![3]);

    let (_, body) = call(&app.router, test_request("GET", "/api/dinamiques?search=debat&limit=1")).await;
    assert_eq!(body["total"], 1);
    assert_eq!(ids(&body["dinamiques"]), vec![2]);
}

#[tokio::test]
async fn test_listing_pages() {
    let app = setup_app();
    let (_, body) = call(&app.router, test_request("GET", "/api/dinamiques?limit=2&page=2")).await;
    assert_eq!(body["total"], 4);
    assert_eq!(ids(&body["dinamiques"]), vec![2, 1]);

    // out-of-range pages clamp to the last one
    let (_, body) = call(&app.router, test_request("GET", "/api/dinamiques?limit=3&page=9")).await;
    assert_eq!(ids(&body["dinamiques"]), vec![1]);
}

#[tokio::test]
async fn test_listing_rejects_unknown_track() {
    let app = setup_app();
    let (status, body) = call(&app.router, test_request("GET", "/api/dinamiques?target=XYZ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_detail_found_and_missing() {
    let app = setup_app();
    let (status, body) = call(&app.router, test_request("GET", "/api/dinamica/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["titol"], "Debat obert");

    let (status, body) = call(&app.router, test_request("GET", "/api/dinamica/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Statistics
// =============================================================================

#[tokio::test]
async fn test_stats_and_option_lists() {
    let app = setup_app();
    let (_, stats) = call(&app.router, test_request("GET", "/api/stats")).await;
    assert_eq!(stats["total"], 4);
    assert_eq!(stats["per_track"]["TIS"], 2);
    assert_eq!(stats["top_modules"].as_array().unwrap().len(), 2);

    let (_, models) = call(&app.router, test_request("GET", "/api/models")).await;
    assert_eq!(models[0], json!({ "name": "claude", "count": 3 }));

    let (_, types) = call(&app.router, test_request("GET", "/api/tipus")).await;
    assert_eq!(types[0], json!({ "name": "joc", "count": 2 }));
}

// =============================================================================
// Catalog session
// =============================================================================

#[tokio::test]
async fn test_catalog_default_view() {
    let app = setup_app();
    let (status, body) = call(&app.router, test_request("GET", "/api/catalog")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["records"]), vec![4, 3]);
    assert_eq!(body["counts"], json!({ "total": 4, "matching": 4, "shown": 2 }));
    assert_eq!(body["has_more"], true);
    assert_eq!(body["active_filters"], 0);
    assert_eq!(body["options"]["modules"].as_array().unwrap().len(), 2);
    assert_eq!(body["models"], json!(["claude", "gpt"]));
}

#[tokio::test]
async fn test_catalog_query_and_load_more() {
    let app = setup_app();
    let query = json!({ "filters": { "temps": 60 }, "sort": "time-asc", "page": 1 });
    let (status, body) = call(&app.router, json_request("POST", "/api/catalog", query)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["records"]), vec![3, 1]);
    assert_eq!(body["counts"]["matching"], 3);
    assert_eq!(body["active_filters"], 1);

    let (_, body) = call(&app.router, test_request("POST", "/api/catalog/more")).await;
    assert_eq!(ids(&body["records"]), vec![3, 1, 4]);
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn test_catalog_resets_stale_module() {
    let app = setup_app();
    let query = json!({
        "filters": { "cicle": "TAPD", "mp": "MP09 - Habilitats socials [TIS]" }
    });
    let (_, body) = call(&app.router, json_request("POST", "/api/catalog", query)).await;
    assert_eq!(body["filters"]["mp"], "all");
    assert_eq!(body["options"]["modules"], json!(["MP02 - Atenció sanitària [TAPD]"]));
    assert_eq!(body["counts"]["matching"], 2);
}

#[tokio::test]
async fn test_search_applies_once_settled() {
    let app = setup_app();
    for text in ["te", "tera", "teranyina"] {
        let (status, body) = call(&app.router, json_request("POST", "/api/catalog/search", json!({ "search": text }))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["pending"], text);
    }

    let mut matching = Value::Null;
    for _ in 0..100 {
        tokio::time::sleep(SEARCH_QUIET).await;
        let (_, body) = call(&app.router, test_request("GET", "/api/catalog")).await;
        matching = body["counts"]["matching"].clone();
        if matching == 1 {
            assert_eq!(body["filters"]["search"], "teranyina");
            assert_eq!(ids(&body["records"]), vec![3]);
            break;
        }
    }
    assert_eq!(matching, 1);
}

// =============================================================================
// Favorites and comparison
// =============================================================================

#[tokio::test]
async fn test_toggle_favorite_persists() {
    let app = setup_app();
    let (status, body) = call(&app.router, test_request("POST", "/api/favorites/3/toggle")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 3, "favorite": true }));
    assert_eq!(app.store.get(FAVORITES_KEY).unwrap().as_deref(), Some("[3]"));

    let (_, body) = call(&app.router, test_request("GET", "/api/favorites")).await;
    assert_eq!(body["favorites"], json!([3]));

    let query = json!({ "filters": { "favoritesOnly": true } });
    let (_, body) = call(&app.router, json_request("POST", "/api/catalog", query)).await;
    assert_eq!(ids(&body["records"]), vec![3]);

    let (status, _) = call(&app.router, test_request("POST", "/api/favorites/99/toggle")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_compare_limit() {
    let app = setup_app();
    for id in 1..=3 {
        let (status, _) = call(&app.router, test_request("POST", &format!("/api/compare/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = call(&app.router, test_request("POST", "/api/compare/4")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = call(&app.router, test_request("DELETE", "/api/compare/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ids"], json!([1, 3]));

    let (_, body) = call(&app.router, test_request("DELETE", "/api/compare")).await;
    assert_eq!(body["ids"], json!([]));
}

// =============================================================================
// Reload
// =============================================================================

#[tokio::test]
async fn test_reload_applies_source() {
    let records = sample();
    let catalog = Catalog::default();
    let state = AppState::new(
        catalog,
        Arc::new(MemorySource::new(records)),
        Arc::new(MemoryKeyValueStore::new()),
        500,
        SEARCH_QUIET,
    );
    let router = build_router(state);

    let (_, body) = call(&router, test_request("GET", "/api/catalog")).await;
    assert_eq!(body["counts"]["total"], 0);

    let (status, body) = call(&router, test_request("POST", "/api/reload")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "applied");
    assert_eq!(body["records"], 4);

    let (_, body) = call(&router, test_request("GET", "/api/catalog")).await;
    assert_eq!(body["counts"]["total"], 4);
}
