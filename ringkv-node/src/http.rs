//! # Node HTTP surface
//!
//! The cache node's external contract (spec C3): a thin axum layer over
//! `ringkv_engine::CacheEngine`, plus the privileged `/admin/shutdown`
//! endpoint the chaos controller (C8) needs as a termination capability.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tokio::sync::Notify;

use ringkv_common::dto::{
    CacheDeleteResponse, CacheGetResponse, CacheKeysResponse, CacheSetRequest,
    CacheStatsResponse, HealthResponse, KeySnapshotEntry,
};
use ringkv_common::{ApiError, ApiResult};
use ringkv_engine::CacheEngine;

pub struct AppState {
    pub engine: Arc<CacheEngine>,
    pub port: u16,
    pub shutdown: Notify,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cache/:key", get(get_cache).delete(delete_cache))
        .route("/cache", post(set_cache))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/keys", get(cache_keys))
        .route("/cache/clear", post(clear_cache))
        .route("/health", get(health))
        .route("/admin/shutdown", post(admin_shutdown))
        .with_state(state)
}

#[tracing::instrument(skip(state))]
async fn get_cache(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<CacheGetResponse>> {
    match state.engine.get(&key) {
        Some(value) => Ok(Json(CacheGetResponse { value, hit: true })),
        None => Err(ApiError::NotFound),
    }
}

#[tracing::instrument(skip(state, body))]
async fn set_cache(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CacheSetRequest>,
) -> ApiResult<axum::http::StatusCode> {
    state
        .engine
        .put(body.key, body.value, body.ttl)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(axum::http::StatusCode::CREATED)
}

#[tracing::instrument(skip(state))]
async fn delete_cache(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Json<CacheDeleteResponse> {
    let deleted = state.engine.delete(&key);
    Json(CacheDeleteResponse { deleted })
}

#[tracing::instrument(skip(state))]
async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    let stats = state.engine.stats();
    Json(CacheStatsResponse {
        hits: stats.hits,
        misses: stats.misses,
        hit_rate: stats.hit_rate,
        current_size: stats.current_size,
        capacity: stats.capacity,
    })
}

#[tracing::instrument(skip(state))]
async fn cache_keys(State(state): State<Arc<AppState>>) -> Json<CacheKeysResponse> {
    let keys = state
        .engine
        .snapshot()
        .into_iter()
        .map(|entry| KeySnapshotEntry {
            key: entry.key,
            value: entry.value,
            ttl_remaining_seconds: entry.ttl_remaining_seconds,
        })
        .collect();
    Json(CacheKeysResponse { keys })
}

#[tracing::instrument(skip(state))]
async fn clear_cache(State(state): State<Arc<AppState>>) -> axum::http::StatusCode {
    state.engine.clear();
    axum::http::StatusCode::OK
}

#[tracing::instrument(skip(state))]
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string(), port: state.port })
}

/// Triggers graceful shutdown of the serving task. The response is sent
/// before the listener stops accepting new connections.
#[tracing::instrument(skip(state))]
async fn admin_shutdown(State(state): State<Arc<AppState>>) -> axum::http::StatusCode {
    tracing::warn!(port = state.port, "shutdown requested via admin endpoint");
    state.engine.shutdown();
    state.shutdown.notify_one();
    axum::http::StatusCode::OK
}
