//! # ringkv-engine
//!
//! The capacity-bounded, recency-ordered, TTL-aware cache engine that backs
//! a single cache node (spec §4.1 / §3). All mutation goes through one lock;
//! the engine favors predictable O(1) gets/puts over sharded throughput,
//! since each node process already parallelizes across connections at the
//! HTTP layer, not inside the store.

mod engine;
mod sweeper;

pub use engine::{CacheEngine, EngineError, EngineResult, EntrySnapshot, Stats};
pub use sweeper::SweeperHandle;
