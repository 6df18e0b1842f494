//! # Consistent-hash ring
//!
//! A fingerprint function `H` maps strings to a 128-bit fingerprint (taken
//! from the high 16 bytes of a SHA-256 digest, which gives the "fixed-width
//! non-negative integer space" spec §4.4 asks for without needing a custom
//! hash). Each physical node contributes `K` virtual positions
//! `H(id || "#" || i)`. Ring storage is a sorted `Vec`, behind a
//! `parking_lot::RwLock<Arc<_>>` so resolution can clone the `Arc` and read
//! it lock-free, per the copy-on-write strategy spec §9 suggests; only
//! `add`/`remove` take the write lock.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// Recommended default for virtual nodes per physical node (spec §4.4: "K
/// fixed, ≥ 10"; §4.6 recommends ≥ 50 for the proxy's configured ring).
pub const DEFAULT_VIRTUAL_NODES: usize = 50;

pub type RingNode = String;

/// One virtual-node entry: a ring position and the physical node it maps to.
#[derive(Debug, Clone)]
pub struct VirtualNode {
    pub position: u128,
    pub node_id: RingNode,
}

struct RingState {
    positions: Vec<VirtualNode>,
}

impl RingState {
    fn empty() -> Self {
        RingState { positions: Vec::new() }
    }
}

/// The consistent-hash ring (spec C4).
pub struct HashRing {
    virtual_nodes: usize,
    state: RwLock<Arc<RingState>>,
}

impl HashRing {
    pub fn new(virtual_nodes: usize) -> Self {
        HashRing {
            virtual_nodes: virtual_nodes.max(1),
            state: RwLock::new(Arc::new(RingState::empty())),
        }
    }

    /// Inserts `K` virtual positions for `id`. Idempotent: adding an id
    /// already present first removes its old positions, so re-adding moves
    /// nothing. O(K log R) where R is the resulting ring size.
    pub fn add(&self, id: impl Into<RingNode>) {
        let id = id.into();
        let mut guard = self.state.write();
        let mut positions: Vec<VirtualNode> = guard
            .positions
            .iter()
            .filter(|vn| vn.node_id != id)
            .cloned()
            .collect();

        let mut existing: HashSet<u128> = positions.iter().map(|vn| vn.position).collect();
        let mut inserted = 0usize;
        for i in 0.. {
            if inserted >= self.virtual_nodes {
                break;
            }
            let pos = hash_position(&id, i);
            if existing.insert(pos) {
                positions.push(VirtualNode { position: pos, node_id: id.clone() });
                inserted += 1;
            }
        }

        positions.sort_by_key(|vn| vn.position);
        *guard = Arc::new(RingState { positions });
    }

    /// Removes every virtual-node entry belonging to `id`.
    pub fn remove(&self, id: &str) {
        let mut guard = self.state.write();
        let positions: Vec<VirtualNode> = guard
            .positions
            .iter()
            .filter(|vn| vn.node_id != id)
            .cloned()
            .collect();
        *guard = Arc::new(RingState { positions });
    }

    /// Resolves the ordered replica set for `key`: the first `n` distinct
    /// physical nodes walked clockwise from `key`'s ring position. `n` is
    /// implicitly clamped to the number of distinct physical nodes present,
    /// since the walk can never produce more than that.
    pub fn replicas(&self, key: &str, n: usize) -> Vec<RingNode> {
        let state = self.state.read().clone();
        let positions = &state.positions;
        if positions.is_empty() || n == 0 {
            return Vec::new();
        }

        let target = hash_key(key);
        let start = positions.partition_point(|vn| vn.position < target) % positions.len();

        let len = positions.len();
        let mut seen = HashSet::with_capacity(n.min(len));
        let mut result = Vec::with_capacity(n.min(len));
        for offset in 0..len {
            let idx = (start + offset) % len;
            let id = &positions[idx].node_id;
            if seen.insert(id.clone()) {
                result.push(id.clone());
                if result.len() == n {
                    break;
                }
            }
        }
        result
    }

    /// The primary (first replica) for `key`, or `None` if the ring is empty.
    pub fn primary(&self, key: &str) -> Option<RingNode> {
        self.replicas(key, 1).into_iter().next()
    }

    /// All distinct physical node ids currently on the ring.
    pub fn physical_nodes(&self) -> Vec<RingNode> {
        let state = self.state.read().clone();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for vn in &state.positions {
            if seen.insert(vn.node_id.clone()) {
                out.push(vn.node_id.clone());
            }
        }
        out
    }

    /// Number of distinct physical nodes on the ring.
    pub fn node_count(&self) -> usize {
        self.physical_nodes().len()
    }

    /// Every virtual-node position as `(id, angle)`, `angle` in
    /// `[0, 360)`, for the visualization front-end only — routing never
    /// consults this.
    pub fn snapshot(&self) -> Vec<(RingNode, f64)> {
        let state = self.state.read().clone();
        state
            .positions
            .iter()
            .map(|vn| (vn.node_id.clone(), angle_of(vn.position)))
            .collect()
    }
}

fn angle_of(position: u128) -> f64 {
    (position as f64 / u128::MAX as f64) * 360.0
}

fn hash_position(id: &str, i: u32) -> u128 {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(b"#");
    hasher.update(i.to_string().as_bytes());
    fingerprint(hasher)
}

fn hash_key(key: &str) -> u128 {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    fingerprint(hasher)
}

fn fingerprint(hasher: Sha256) -> u128 {
    let digest = hasher.finalize();
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(buf)
}
