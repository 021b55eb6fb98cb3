//! Integration tests driving the HTTP surface end to end against a real,
//! temporary RocksDB store, the same way the service is actually driven in
//! production — through `tower::ServiceExt::oneshot` rather than by calling
//! engine methods directly.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use bigcache::engine::CacheEngine;
use bigcache::handlers;
use bigcache::state::AppState;

fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/cache/*key",
            post(handlers::set_cache)
                .get(handlers::get_cache)
                .delete(handlers::delete_cache),
        )
        .route("/pickle/*key", post(handlers::set_pickle).get(handlers::get_pickle))
        .route("/prefix/*prefix", delete(handlers::delete_prefix))
        .route("/stat", get(handlers::stats))
        .route("/stat/count", get(handlers::count))
        .route("/clear", get(handlers::clear))
        .route("/close", get(handlers::close))
        .route("/health", get(handlers::health))
        .with_state(state)
}

fn test_state(dir: &tempfile::TempDir) -> AppState {
    let engine = CacheEngine::open(dir.path().join("db").to_str().unwrap()).expect("open engine");
    AppState::new(Arc::new(engine))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn set_and_get_json_entry_with_duration() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(&dir));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/cache/greeting")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"value": {"hello": "world"}, "duration": "10m"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_body = body_json(response).await;
    assert_eq!(set_body["value"], json!({"hello": "world"}));
    assert!(set_body["expire"].as_f64().is_some());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/cache/greeting")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let get_body = body_json(response).await;
    assert_eq!(get_body["value"], json!({"hello": "world"}));
    assert_eq!(get_body["duration"], "10m");
}

#[tokio::test]
async fn expired_entry_reads_as_not_found_then_as_plain_miss() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(&dir));

    let past = 1.0;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/cache/stale")
                .header("content-type", "application/json")
                .body(Body::from(json!({"value": "gone", "expire": past}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/cache/stale")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let first_miss = body_json(response).await;
    assert_eq!(first_miss["message"], "cached data has expired");

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/cache/stale")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let second_miss = body_json(response).await;
    assert_eq!(second_miss["message"], "cached data not found");
}

#[tokio::test]
async fn delete_then_delete_again_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(&dir));

    app.clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/cache/to-delete")
                .header("content-type", "application/json")
                .body(Body::from(json!({"value": 1}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/cache/to-delete")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/cache/to-delete")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_prefix_removes_only_matching_keys() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(&dir));

    for key in ["a/1", "a/2", "a/3", "b/1"] {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("/cache/{key}"))
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"value": key}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/prefix/a")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let deleted = body_json(response).await;
    assert_eq!(deleted["message"], "deleted 3 keys under prefix 'a'");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/cache/b/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/cache/a/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn opaque_round_trip_preserves_non_utf8_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(&dir));

    let raw: Vec<u8> = vec![0x00, 0x01, 0xFF, 0x7F];

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/pickle/blob")
                .header("content-type", "application/octet-stream")
                .body(Body::from(raw.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/pickle/blob")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.to_vec(), raw);
}

#[tokio::test]
async fn key_path_is_normalized_of_surrounding_slashes() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(&dir));

    app.clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/cache//a/b//")
                .header("content-type", "application/json")
                .body(Body::from(json!({"value": "nested"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/cache//a/b/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["key"], "a/b");
    assert_eq!(body["value"], "nested");
}

#[tokio::test]
async fn clear_resets_count_and_keeps_engine_usable() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(&dir));

    for key in ["x", "y", "z"] {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("/cache/{key}"))
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"value": key}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/stat/count")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["count"], 0);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/cache/after-clear")
                .header("content-type", "application/json")
                .body(Body::from(json!({"value": "still works"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_check_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(&dir));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
