//! Shared proxy state: one instance per process, handed to every handler
//! behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use ringkv_ring::{HashRing, PartitionMatrix, DEFAULT_VIRTUAL_NODES};
use ringkv_store::BackingStore;

use crate::chaos::ChaosController;
use crate::membership::Membership;

/// Configuration enumerated in spec §4.6.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub replication_factor: usize,
    pub http_timeout_per_call: Duration,
    pub health_check_period: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            replication_factor: 2,
            http_timeout_per_call: Duration::from_secs(2),
            health_check_period: Duration::from_secs(3),
        }
    }
}

pub struct AppState {
    pub membership: Arc<Membership>,
    pub partitions: Arc<PartitionMatrix>,
    pub store: Arc<BackingStore>,
    pub chaos: Arc<ChaosController>,
    pub config: ProxyConfig,
}

impl AppState {
    pub fn new(store: BackingStore, config: ProxyConfig) -> Arc<Self> {
        let ring = Arc::new(HashRing::new(DEFAULT_VIRTUAL_NODES));
        let membership = Arc::new(Membership::new(ring, config.http_timeout_per_call));
        let chaos = Arc::new(ChaosController::new(Arc::clone(&membership)));
        Arc::new(AppState {
            membership,
            partitions: Arc::new(PartitionMatrix::new()),
            store: Arc::new(store),
            chaos,
            config,
        })
    }
}
