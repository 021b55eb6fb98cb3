//! Maps the documented URL space onto Cache Engine operations. Every call
//! into the engine is offloaded via `tokio::task::spawn_blocking` so a slow
//! disk operation never blocks unrelated requests on the network thread.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::engine::CacheEngine;
use crate::error::{CacheError, CacheResult};
use crate::state::AppState;

/// Strips leading and trailing `/` from a captured path tail before it
/// touches the store. Keys may still contain embedded `/`.
fn normalize_key(raw: &str) -> String {
    raw.trim_matches('/').to_string()
}

async fn offload<T, F>(engine: Arc<CacheEngine>, f: F) -> CacheResult<T>
where
    F: FnOnce(&CacheEngine) -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(move || f(&engine)).await?)
}

#[derive(Debug, Deserialize)]
pub struct SetRequest {
    pub value: serde_json::Value,
    #[serde(default)]
    pub expire: Option<f64>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetResponse {
    pub key: String,
    pub value: serde_json::Value,
    pub expire: Option<f64>,
}

pub async fn set_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<SetRequest>,
) -> CacheResult<Json<SetResponse>> {
    let key = normalize_key(&key);
    tracing::debug!(key = %key, "set");

    let engine = state.engine.clone();
    let key_for_store = key.clone();
    let outcome = offload(engine, move |engine| {
        engine.set(&key_for_store, body.value, body.expire, body.duration)
    })
    .await??;

    Ok(Json(SetResponse {
        key: outcome.key,
        value: outcome.value,
        expire: outcome.expire,
    }))
}

#[derive(Debug, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: serde_json::Value,
    pub expire: Option<f64>,
    pub duration: Option<String>,
}

pub async fn get_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> CacheResult<Json<GetResponse>> {
    let key = normalize_key(&key);
    tracing::debug!(key = %key, "get");

    let engine = state.engine.clone();
    let key_for_store = key.clone();
    let outcome = offload(engine, move |engine| engine.get(&key_for_store))
        .await??;

    Ok(Json(GetResponse {
        key,
        value: outcome.value,
        expire: outcome.expire,
        duration: outcome.duration,
    }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn delete_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> CacheResult<Json<MessageResponse>> {
    let key = normalize_key(&key);
    tracing::debug!(key = %key, "delete");

    let engine = state.engine.clone();
    let key_for_store = key.clone();
    offload(engine, move |engine| engine.delete(&key_for_store))
        .await??;

    Ok(Json(MessageResponse {
        message: format!("key '{key}' deleted from cache"),
    }))
}

#[derive(Debug, Serialize)]
pub struct PickleSetResponse {
    pub key: String,
    pub expire: &'static str,
}

pub async fn set_pickle(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> CacheResult<Json<PickleSetResponse>> {
    let key = normalize_key(&key);
    tracing::debug!(key = %key, bytes = body.len(), "set_opaque");

    let engine = state.engine.clone();
    let key_for_store = key.clone();
    offload(engine, move |engine| engine.set_opaque(&key_for_store, &body))
        .await??;

    Ok(Json(PickleSetResponse {
        key,
        expire: "not set",
    }))
}

pub async fn get_pickle(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> CacheResult<Response> {
    let key = normalize_key(&key);
    tracing::debug!(key = %key, "get_opaque");

    let engine = state.engine.clone();
    let key_for_store = key.clone();
    let bytes = offload(engine, move |engine| engine.get_opaque(&key_for_store))
        .await??;

    Ok(bytes.into_response())
}

pub async fn delete_prefix(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> CacheResult<Json<MessageResponse>> {
    let prefix = normalize_key(&prefix);
    tracing::debug!(prefix = %prefix, "delete_prefix");

    if prefix.is_empty() {
        return Err(CacheError::BadRequest("prefix must not be empty".to_string()));
    }

    let engine = state.engine.clone();
    let prefix_for_store = prefix.clone();
    let deleted = offload(engine, move |engine| engine.delete_prefix(&prefix_for_store))
        .await??;

    Ok(Json(MessageResponse {
        message: format!("deleted {deleted} keys under prefix '{prefix}'"),
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: crate::engine::Stats,
}

pub async fn stats(State(state): State<AppState>) -> CacheResult<Json<StatsResponse>> {
    let engine = state.engine.clone();
    let stats = offload(engine, |engine| engine.stats()).await?;
    Ok(Json(StatsResponse { stats }))
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

pub async fn count(State(state): State<AppState>) -> CacheResult<Json<CountResponse>> {
    tracing::debug!("count: O(n) full scan, no concurrency guarantee");
    let engine = state.engine.clone();
    let count = offload(engine, |engine| engine.count()).await??;
    Ok(Json(CountResponse { count }))
}

pub async fn clear(State(state): State<AppState>) -> CacheResult<Json<MessageResponse>> {
    tracing::info!("clearing cache store");
    let engine = state.engine.clone();
    offload(engine, |engine| engine.reset()).await??;
    Ok(Json(MessageResponse {
        message: "cache cleared".to_string(),
    }))
}

pub async fn close(State(state): State<AppState>) -> CacheResult<Json<MessageResponse>> {
    tracing::info!("closing cache store");
    let engine = state.engine.clone();
    offload(engine, |engine| engine.close()).await??;
    Ok(Json(MessageResponse {
        message: "cache store closed".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
