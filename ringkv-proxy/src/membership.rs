//! # Membership & liveness (C7)
//!
//! Tracks registered node descriptors and drives the background health
//! loop that prunes dead nodes from the ring after two consecutive failed
//! probes. Re-addition of a returning node is always an explicit client
//! action (`add_node`); nothing here auto-recovers a pruned entry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinSet;

use ringkv_client::NodeClient;
use ringkv_common::dto::RingNodeView;
use ringkv_ring::HashRing;

/// Consecutive failed health probes before a node is pruned (spec §4.7).
const FAILURE_THRESHOLD: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("could not build client for node: {0}")]
    Client(String),
}

pub struct NodeEntry {
    pub host: String,
    pub port: u16,
    pub client: NodeClient,
    consecutive_failures: Mutex<u32>,
    last_healthy_at: Mutex<Option<SystemTime>>,
}

pub fn node_id(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}

/// Parses the port suffix out of a `"host:port"` ring node id.
pub fn port_of(id: &str) -> Option<u16> {
    id.rsplit(':').next()?.parse().ok()
}

pub struct Membership {
    ring: Arc<HashRing>,
    nodes: RwLock<HashMap<String, Arc<NodeEntry>>>,
    http_timeout: Duration,
}

impl Membership {
    pub fn new(ring: Arc<HashRing>, http_timeout: Duration) -> Self {
        Membership { ring, nodes: RwLock::new(HashMap::new()), http_timeout }
    }

    /// Registers `host:port`, inserting it into the ring. Idempotent: an
    /// id already present is simply re-added (spec §4.7).
    pub fn add_node(&self, host: String, port: u16) -> Result<Vec<RingNodeView>, MembershipError> {
        let id = node_id(&host, port);
        let client = NodeClient::new(format!("http://{host}:{port}"), self.http_timeout)
            .map_err(|err| MembershipError::Client(err.to_string()))?;
        let entry = Arc::new(NodeEntry {
            host,
            port,
            client,
            consecutive_failures: Mutex::new(0),
            last_healthy_at: Mutex::new(None),
        });
        self.nodes.write().insert(id.clone(), entry);
        self.ring.add(id);
        Ok(self.ring_snapshot())
    }

    /// Removes the node bound to `port`. Returns `false` if none was
    /// registered under that port (caller maps this to `BadRequest`).
    pub fn remove_node(&self, port: u16) -> bool {
        let id = {
            let nodes = self.nodes.read();
            nodes.iter().find(|(_, e)| e.port == port).map(|(id, _)| id.clone())
        };
        match id {
            Some(id) => {
                self.nodes.write().remove(&id);
                self.ring.remove(&id);
                true
            }
            None => false,
        }
    }

    pub fn ring_snapshot(&self) -> Vec<RingNodeView> {
        self.ring
            .snapshot()
            .into_iter()
            .map(|(id, angle)| RingNodeView { id, angle })
            .collect()
    }

    pub fn node(&self, id: &str) -> Option<Arc<NodeEntry>> {
        self.nodes.read().get(id).cloned()
    }

    pub fn live_nodes(&self) -> Vec<(String, Arc<NodeEntry>)> {
        self.nodes.read().iter().map(|(id, e)| (id.clone(), Arc::clone(e))).collect()
    }

    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    /// One iteration of the liveness loop (spec §4.7): probes every
    /// registered node concurrently with a 1s timeout, and prunes any node
    /// that has now failed two consecutive times.
    pub async fn health_tick(&self) {
        let nodes = self.live_nodes();
        let mut set = JoinSet::new();
        for (id, entry) in nodes {
            set.spawn(async move {
                let probe = tokio::time::timeout(Duration::from_secs(1), entry.client.health()).await;
                match probe {
                    Ok(Ok(_)) => {
                        *entry.consecutive_failures.lock() = 0;
                        *entry.last_healthy_at.lock() = Some(SystemTime::now());
                        None
                    }
                    _ => {
                        let mut failures = entry.consecutive_failures.lock();
                        *failures += 1;
                        if *failures >= FAILURE_THRESHOLD {
                            Some(id)
                        } else {
                            None
                        }
                    }
                }
            });
        }

        let mut dead = Vec::new();
        while let Some(result) = set.join_next().await {
            if let Ok(Some(id)) = result {
                dead.push(id);
            }
        }

        for id in dead {
            tracing::warn!(node = %id, "pruning node after 2 consecutive failed health checks");
            self.nodes.write().remove(&id);
            self.ring.remove(&id);
        }
    }
}
