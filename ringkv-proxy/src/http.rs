//! # Proxy HTTP surface
//!
//! The external interface from spec §6 plus the observability surface
//! (C9): data-plane routes, cluster/membership admin, the partition
//! matrix, and the chaos controller.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;

use ringkv_common::dto::{
    AddNodeRequest, ChaosMessageResponse, DataGetQuery, DataGetResponse, DataPutRequest,
    DataPutResponse, PartitionListResponse, PartitionView, RingSnapshotResponse,
};
use ringkv_common::{ApiError, ApiResult};

use crate::state::AppState;
use crate::{data, observability};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/data", post(put_data))
        .route("/data/:key", get(get_data).delete(delete_data))
        .route("/cluster/add-node", post(add_node))
        .route("/cluster/remove-node/:port", delete(remove_node))
        .route("/partition/create", post(create_partition))
        .route("/partition/remove", post(remove_partition))
        .route("/partition/list", get(list_partitions))
        .route("/chaos/start", post(chaos_start))
        .route("/chaos/stop", post(chaos_stop))
        .route("/chaos/status", get(chaos_status))
        .route("/cluster/map", get(cluster_map))
        .route("/stats/global", get(stats_global))
        .route("/debug/keys", get(debug_keys))
        .with_state(state)
}

#[tracing::instrument(skip(state, body))]
async fn put_data(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DataPutRequest>,
) -> ApiResult<Json<DataPutResponse>> {
    let response = data::put(&state, &body.key, &body.value, body.ttl).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(state))]
async fn get_data(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<DataGetQuery>,
) -> ApiResult<Json<DataGetResponse>> {
    let response = data::get(&state, &key, query.bypass_cache).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(state))]
async fn delete_data(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<axum::http::StatusCode> {
    data::delete(&state, &key).await?;
    Ok(axum::http::StatusCode::OK)
}

#[tracing::instrument(skip(state, body))]
async fn add_node(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddNodeRequest>,
) -> ApiResult<Json<RingSnapshotResponse>> {
    let nodes = state
        .membership
        .add_node(body.host, body.port)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Json(RingSnapshotResponse { nodes }))
}

#[tracing::instrument(skip(state))]
async fn remove_node(
    State(state): State<Arc<AppState>>,
    Path(port): Path<u16>,
) -> ApiResult<axum::http::StatusCode> {
    if state.membership.remove_node(port) {
        Ok(axum::http::StatusCode::OK)
    } else {
        Err(ApiError::BadRequest(format!("no node registered on port {port}")))
    }
}

#[derive(Debug, Deserialize)]
struct PartitionPorts {
    source_port: u16,
    target_port: u16,
}

#[tracing::instrument(skip(state))]
async fn create_partition(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PartitionPorts>,
) -> ApiResult<axum::http::StatusCode> {
    if state.partitions.create(query.source_port, query.target_port) {
        Ok(axum::http::StatusCode::OK)
    } else {
        Err(ApiError::BadRequest("source_port and target_port must differ".to_string()))
    }
}

#[tracing::instrument(skip(state))]
async fn remove_partition(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PartitionPorts>,
) -> ApiResult<axum::http::StatusCode> {
    if state.partitions.remove(query.source_port, query.target_port) {
        Ok(axum::http::StatusCode::OK)
    } else {
        Err(ApiError::BadRequest("source_port and target_port must differ".to_string()))
    }
}

#[tracing::instrument(skip(state))]
async fn list_partitions(State(state): State<Arc<AppState>>) -> Json<PartitionListResponse> {
    let partitions = state
        .partitions
        .list()
        .into_iter()
        .map(|(source, target)| PartitionView { source, target })
        .collect();
    Json(PartitionListResponse { partitions })
}

#[tracing::instrument(skip(state))]
async fn chaos_start(State(state): State<Arc<AppState>>) -> ApiResult<Json<ChaosMessageResponse>> {
    state
        .chaos
        .start()
        .map_err(|err| ApiError::Conflict(err.to_string()))?;
    Ok(Json(ChaosMessageResponse { message: "chaos controller started".to_string() }))
}

#[tracing::instrument(skip(state))]
async fn chaos_stop(State(state): State<Arc<AppState>>) -> ApiResult<Json<ChaosMessageResponse>> {
    state
        .chaos
        .stop()
        .await
        .map_err(|err| ApiError::Conflict(err.to_string()))?;
    Ok(Json(ChaosMessageResponse { message: "chaos controller stopped".to_string() }))
}

#[tracing::instrument(skip(state))]
async fn chaos_status(
    State(state): State<Arc<AppState>>,
) -> Json<ringkv_common::dto::ChaosStatusResponse> {
    Json(state.chaos.status())
}

#[tracing::instrument(skip(state))]
async fn cluster_map(State(state): State<Arc<AppState>>) -> Json<RingSnapshotResponse> {
    Json(observability::cluster_map(&state))
}

#[tracing::instrument(skip(state))]
async fn stats_global(
    State(state): State<Arc<AppState>>,
) -> Json<ringkv_common::dto::GlobalStatsResponse> {
    Json(observability::stats_global(&state).await)
}

#[tracing::instrument(skip(state))]
async fn debug_keys(
    State(state): State<Arc<AppState>>,
) -> Json<ringkv_common::dto::DebugKeysResponse> {
    Json(observability::debug_keys(&state).await)
}
