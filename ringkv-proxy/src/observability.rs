//! # Observability surface (C9)
//!
//! Aggregates live per-node state for the visualization front-end and for
//! operators: the ring map, global hit/miss stats, and the union of every
//! node's live key snapshot.

use ringkv_common::dto::{
    DebugKeyRow, DebugKeysResponse, GlobalStatsResponse, NodeLoad, RequestDistributionEntry,
    RingSnapshotResponse,
};

use crate::state::AppState;

pub fn cluster_map(state: &AppState) -> RingSnapshotResponse {
    RingSnapshotResponse { nodes: state.membership.ring_snapshot() }
}

pub async fn stats_global(state: &AppState) -> GlobalStatsResponse {
    let nodes = state.membership.live_nodes();
    let mut set = tokio::task::JoinSet::new();
    for (id, entry) in nodes {
        set.spawn(async move { (id, entry.client.stats().await) });
    }

    let mut node_load = Vec::new();
    let mut total_hits = 0u64;
    let mut total_misses = 0u64;
    while let Some(result) = set.join_next().await {
        if let Ok((id, Ok(stats))) = result {
            node_load.push(NodeLoad { name: id, keys: stats.current_size });
            total_hits += stats.hits;
            total_misses += stats.misses;
        }
    }

    let total_requests = total_hits + total_misses;
    let hit_rate = if total_requests == 0 {
        0.0
    } else {
        total_hits as f64 / total_requests as f64
    };

    GlobalStatsResponse {
        hit_rate,
        total_requests,
        node_load,
        request_distribution: vec![
            RequestDistributionEntry { name: "Hits".to_string(), value: total_hits },
            RequestDistributionEntry { name: "Misses".to_string(), value: total_misses },
        ],
    }
}

pub async fn debug_keys(state: &AppState) -> DebugKeysResponse {
    let nodes = state.membership.live_nodes();
    let mut set = tokio::task::JoinSet::new();
    for (id, entry) in nodes {
        set.spawn(async move { (id, entry.client.keys().await) });
    }

    let mut rows = Vec::new();
    while let Some(result) = set.join_next().await {
        if let Ok((id, Ok(resp))) = result {
            for entry in resp.keys {
                rows.push(DebugKeyRow {
                    key: entry.key,
                    node: id.clone(),
                    ttl_remaining_seconds: entry.ttl_remaining_seconds,
                });
            }
        }
    }

    DebugKeysResponse { keys: rows }
}
