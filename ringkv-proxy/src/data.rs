//! # Proxy coordinator (C6)
//!
//! Routing, replica fan-out, partition-aware write skipping, and
//! write-through/read-fallback against the backing store. Every operation
//! here is a plain async function over [`crate::state::AppState`] so the
//! HTTP layer (`http.rs`) stays a thin translation from wire DTOs to these
//! calls and back.

use std::collections::HashSet;

use ringkv_common::dto::{DataGetResponse, DataPutResponse};
use ringkv_common::{ApiError, ApiResult};

use crate::membership::port_of;
use crate::state::AppState;

/// `put(key, value, ttl)`: fan out to the replica set (minus any
/// partitioned-off secondary), write through to the backing store
/// regardless of fan-out outcome, and succeed overall iff the store write
/// succeeded AND at least one replica wrote successfully.
pub async fn put(
    state: &AppState,
    key: &str,
    value: &str,
    ttl: Option<u64>,
) -> ApiResult<DataPutResponse> {
    let replicas = state.membership.ring().replicas(key, state.config.replication_factor);
    let Some(primary) = replicas.first().cloned() else {
        return Err(ApiError::Unavailable("no nodes registered".to_string()));
    };

    let mut retained = Vec::with_capacity(replicas.len());
    let mut skipped = Vec::new();
    for replica in &replicas {
        if replica != &primary && is_partitioned(state, &primary, replica) {
            skipped.push(replica.clone());
        } else {
            retained.push(replica.clone());
        }
    }

    let mut set = tokio::task::JoinSet::new();
    for id in retained.clone() {
        let node = state.membership.node(&id);
        let key = key.to_string();
        let value = value.to_string();
        let timeout = state.config.http_timeout_per_call;
        set.spawn(async move {
            let ok = match node {
                Some(entry) => {
                    tokio::time::timeout(timeout, entry.client.put(&key, &value, ttl))
                        .await
                        .map(|r| r.is_ok())
                        .unwrap_or(false)
                }
                None => false,
            };
            (id, ok)
        });
    }

    let mut successful = HashSet::new();
    while let Some(result) = set.join_next().await {
        if let Ok((id, true)) = result {
            successful.insert(id);
        }
    }

    let store_ok = state.store.set(key, value, ttl).is_ok();

    let nodes: Vec<String> = retained.into_iter().filter(|id| successful.contains(id)).collect();

    if !store_ok || nodes.is_empty() {
        return Err(ApiError::Unavailable(
            "write did not reach the backing store and at least one replica".to_string(),
        ));
    }

    Ok(DataPutResponse {
        nodes,
        skipped,
        backing_store: "ok".to_string(),
    })
}

/// `get(key, bypass_cache)`: cache-primary read with backing-store
/// fallback and best-effort repopulation, or a direct store read when
/// `bypass_cache` is set.
pub async fn get(state: &AppState, key: &str, bypass_cache: bool) -> ApiResult<DataGetResponse> {
    if bypass_cache {
        return match store_get(state, key)? {
            Some((value, _ttl)) => Ok(DataGetResponse { value, source: "db".to_string(), node: None }),
            None => Err(ApiError::NotFound),
        };
    }

    let Some(primary_id) = state.membership.ring().primary(key) else {
        return Err(ApiError::Unavailable("no nodes registered".to_string()));
    };

    if let Some(entry) = state.membership.node(&primary_id) {
        let probe = tokio::time::timeout(state.config.http_timeout_per_call, entry.client.get(key)).await;
        if let Ok(Ok(Some(resp))) = probe {
            return Ok(DataGetResponse {
                value: resp.value,
                source: "cache".to_string(),
                node: Some(primary_id),
            });
        }
    }

    match store_get(state, key)? {
        Some((value, ttl)) => {
            if let Some(entry) = state.membership.node(&primary_id) {
                let _ = entry.client.put(key, &value, ttl).await;
            }
            Ok(DataGetResponse { value, source: "db".to_string(), node: None })
        }
        None => Err(ApiError::NotFound),
    }
}

/// `delete(key)`: best-effort fan-out delete across the replica set, then
/// an authoritative delete from the backing store.
pub async fn delete(state: &AppState, key: &str) -> ApiResult<()> {
    let replicas = state.membership.ring().replicas(key, state.config.replication_factor);
    let mut set = tokio::task::JoinSet::new();
    for id in replicas {
        if let Some(entry) = state.membership.node(&id) {
            let key = key.to_string();
            set.spawn(async move {
                let _ = entry.client.delete(&key).await;
            });
        }
    }
    while set.join_next().await.is_some() {}

    state.store.delete(key).map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(())
}

fn is_partitioned(state: &AppState, a: &str, b: &str) -> bool {
    match (port_of(a), port_of(b)) {
        (Some(a), Some(b)) => state.partitions.has(a, b),
        _ => false,
    }
}

fn store_get(state: &AppState, key: &str) -> ApiResult<Option<(String, Option<u64>)>> {
    state.store.get(key).map_err(|err| ApiError::Internal(err.to_string()))
}
