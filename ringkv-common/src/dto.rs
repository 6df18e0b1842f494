//! # Wire DTOs
//!
//! JSON request/response shapes for the node HTTP surface (C3), the
//! proxy's data-plane surface (C6), and the proxy's observability surface
//! (C9). Field names match spec §4.3 / §6 / §4.9 exactly.

use serde::{Deserialize, Serialize};

// ---- Node HTTP surface (C3) -------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSetRequest {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub ttl: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheGetResponse {
    pub value: String,
    pub hit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheDeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub current_size: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeySnapshotEntry {
    pub key: String,
    pub value: String,
    pub ttl_remaining_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheKeysResponse {
    pub keys: Vec<KeySnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub port: u16,
}

// ---- Proxy data-plane surface (C6 / §6) --------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DataPutRequest {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub ttl: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataPutResponse {
    pub nodes: Vec<String>,
    pub skipped: Vec<String>,
    pub backing_store: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataGetResponse {
    pub value: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataGetQuery {
    #[serde(default)]
    pub bypass_cache: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

// ---- Cluster / membership (C7) -----------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AddNodeRequest {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct RingNodeView {
    pub id: String,
    pub angle: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RingSnapshotResponse {
    pub nodes: Vec<RingNodeView>,
}

// ---- Partition matrix (C5) ---------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PartitionQuery {
    pub source_port: u16,
    pub target_port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionView {
    pub source: u16,
    pub target: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionListResponse {
    pub partitions: Vec<PartitionView>,
}

// ---- Chaos controller (C8) ----------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ChaosMessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChaosStatusResponse {
    pub enabled: bool,
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
    pub min_surviving_nodes: usize,
}

// ---- Observability surface (C9) ------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct NodeLoad {
    pub name: String,
    pub keys: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestDistributionEntry {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalStatsResponse {
    pub hit_rate: f64,
    pub total_requests: u64,
    pub node_load: Vec<NodeLoad>,
    pub request_distribution: Vec<RequestDistributionEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugKeyRow {
    pub key: String,
    pub node: String,
    pub ttl_remaining_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugKeysResponse {
    pub keys: Vec<DebugKeyRow>,
}
