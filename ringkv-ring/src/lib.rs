//! # ringkv-ring
//!
//! The consistent-hash ring (spec C4) and the partition matrix (spec C5).
//! Both are small, lock-guarded structures shared between the proxy's
//! routing path (read-heavy, read-only under steady membership) and its
//! admin endpoints (membership changes, partition create/remove).

mod hash_ring;
mod partitions;

pub use hash_ring::{HashRing, RingNode, VirtualNode, DEFAULT_VIRTUAL_NODES};
pub use partitions::PartitionMatrix;
