//! # Recency-ordered store
//!
//! Implements an intrusive doubly-linked list over a dense node arena, plus
//! a hash index into list nodes, the same structure the design notes in
//! spec §9 call for: `get` unlinks and reinserts at the tail, `put` inserts
//! at the tail, and capacity eviction drops the head.
//!
//! ## Structure
//!
//! ```text
//! CacheEngine
//!   └── inner: Mutex<Inner>
//!         ├── map: HashMap<String, usize>
//!         ├── nodes: Vec<Option<Node>>
//!         ├── free: Vec<usize>
//!         └── head/tail: LRU indices
//!               └── Node { key, value, expires_at, prev, next }
//! ```
//!
//! Every operation is serialized on a single `parking_lot::Mutex`, which is
//! acceptable per spec §4.1/§5 because each operation is O(1); the
//! background sweep (`purge_expired`) is the one O(n) pass and runs off the
//! hot path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine is shut down")]
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub current_size: usize,
    pub capacity: usize,
}

/// One row of `snapshot()`: a key, its value, and remaining TTL in seconds
/// (`None` for a never-expiring entry).
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub key: String,
    pub value: String,
    pub ttl_remaining_seconds: Option<u64>,
}

#[derive(Debug)]
struct Node {
    key: String,
    value: String,
    expires_at: Option<Instant>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Node {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }
}

struct Inner {
    map: HashMap<String, usize>,
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    closed: bool,
}

impl Inner {
    fn new() -> Self {
        Inner {
            map: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            closed: false,
        }
    }

    fn lru_remove(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.nodes[idx].as_ref().expect("node exists");
            (node.prev, node.next)
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = self.nodes[prev_idx].as_mut() {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = self.nodes[next_idx].as_mut() {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }

    fn lru_push_back(&mut self, idx: usize) {
        let tail = self.tail;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = tail;
            node.next = None;
        }

        match tail {
            Some(tail_idx) => {
                if let Some(tail_node) = self.nodes[tail_idx].as_mut() {
                    tail_node.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }

        self.tail = Some(idx);
    }

    fn touch(&mut self, idx: usize) {
        if self.tail == Some(idx) {
            return;
        }
        self.lru_remove(idx);
        self.lru_push_back(idx);
    }

    fn insert_new(&mut self, key: String, value: String, expires_at: Option<Instant>) -> usize {
        let idx = self.free.pop().unwrap_or_else(|| {
            self.nodes.push(None);
            self.nodes.len() - 1
        });

        self.nodes[idx] = Some(Node {
            key: key.clone(),
            value,
            expires_at,
            prev: None,
            next: None,
        });
        self.lru_push_back(idx);
        self.map.insert(key, idx);
        idx
    }

    fn remove_idx(&mut self, idx: usize) {
        let key = match self.nodes[idx].as_ref() {
            Some(node) => node.key.clone(),
            None => return,
        };
        self.lru_remove(idx);
        self.nodes[idx] = None;
        self.map.remove(&key);
        self.free.push(idx);
    }

    fn pop_lru(&mut self) {
        if let Some(idx) = self.head {
            self.remove_idx(idx);
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Capacity-bounded, recency-ordered, TTL-aware key/value store (spec C1).
pub struct CacheEngine {
    inner: Mutex<Inner>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    closed: AtomicBool,
}

impl CacheEngine {
    /// Creates an engine with a fixed positive capacity.
    pub fn new(capacity: usize) -> Self {
        CacheEngine {
            inner: Mutex::new(Inner::new()),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Looks up `key`. On a live hit, moves the entry to the most-recent
    /// end and increments `hits`; on a miss (absent or expired) increments
    /// `misses`. An expired entry found on access is removed, never
    /// double-counted on a later call (spec property 3).
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        let idx = match inner.map.get(key) {
            Some(&idx) => idx,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let expired = inner.nodes[idx]
            .as_ref()
            .map(|node| node.is_expired(now))
            .unwrap_or(true);

        if expired {
            inner.remove_idx(idx);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let value = inner.nodes[idx].as_ref().map(|node| node.value.clone());
        inner.touch(idx);
        self.hits.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Inserts or replaces `key`. `ttl_seconds` of `None` or `0` means
    /// never-expiring. Evicts the least-recently-used entry if the engine
    /// is over capacity after the insert.
    pub fn put(&self, key: String, value: String, ttl_seconds: Option<u64>) -> EngineResult<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(EngineError::Shutdown);
        }

        let expires_at = match ttl_seconds {
            Some(secs) if secs > 0 => Some(Instant::now() + Duration::from_secs(secs)),
            _ => None,
        };

        if let Some(&idx) = inner.map.get(&key) {
            if let Some(node) = inner.nodes[idx].as_mut() {
                node.value = value;
                node.expires_at = expires_at;
            }
            inner.touch(idx);
            return Ok(());
        }

        inner.insert_new(key, value, expires_at);
        if inner.len() > self.capacity {
            inner.pop_lru();
        }
        Ok(())
    }

    /// Removes `key` if present. Returns whether a live entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let idx = match inner.map.get(key) {
            Some(&idx) => idx,
            None => return false,
        };
        let now = Instant::now();
        let was_live = inner.nodes[idx]
            .as_ref()
            .map(|node| !node.is_expired(now))
            .unwrap_or(false);
        inner.remove_idx(idx);
        was_live
    }

    /// Empties the engine. Hit/miss counters are left untouched (spec §4.1).
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner::new();
    }

    /// Point-in-time hit/miss/size counters.
    pub fn stats(&self) -> Stats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 { 0.0 } else { hits as f64 / total as f64 };
        let current_size = self.inner.lock().len();
        Stats {
            hits,
            misses,
            hit_rate,
            current_size,
            capacity: self.capacity,
        }
    }

    /// Returns every live entry with its remaining TTL, in no particular
    /// order (used by `/cache/keys` and the proxy's `/debug/keys` union).
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        let inner = self.inner.lock();
        let now = Instant::now();
        inner
            .nodes
            .iter()
            .filter_map(|slot| slot.as_ref())
            .filter(|node| !node.is_expired(now))
            .map(|node| EntrySnapshot {
                key: node.key.clone(),
                value: node.value.clone(),
                ttl_remaining_seconds: node
                    .expires_at
                    .map(|deadline| deadline.saturating_duration_since(now).as_secs()),
            })
            .collect()
    }

    /// Removes every entry past its TTL. Returns the number removed. This
    /// is the O(n) pass the background sweeper (`SweeperHandle`) drives
    /// periodically; it is also safe to call directly from tests.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        let expired: Vec<usize> = inner
            .map
            .values()
            .copied()
            .filter(|&idx| {
                inner.nodes[idx]
                    .as_ref()
                    .map(|node| node.is_expired(now))
                    .unwrap_or(false)
            })
            .collect();
        let removed = expired.len();
        for idx in expired {
            inner.remove_idx(idx);
        }
        removed
    }

    /// Number of live+expired-not-yet-swept entries currently indexed.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Marks the engine closed: subsequent `put` calls fail with
    /// `EngineError::Shutdown` (spec §4.1). `get`/`delete`/`stats` keep
    /// working so a node can drain reads during shutdown.
    pub fn shutdown(&self) {
        self.inner.lock().closed = true;
        self.closed.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let engine = CacheEngine::new(4);
        engine.put("alpha".into(), "value".into(), None).unwrap();
        assert_eq!(engine.get("alpha"), Some("value".to_string()));
    }

    #[test]
    fn delete_removes_key() {
        let engine = CacheEngine::new(4);
        engine.put("alpha".into(), "value".into(), None).unwrap();
        assert!(engine.delete("alpha"));
        assert_eq!(engine.get("alpha"), None);
    }

    #[test]
    fn miss_increments_counter_without_double_counting() {
        let engine = CacheEngine::new(4);
        engine.put("alpha".into(), "v".into(), Some(1)).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(engine.get("alpha"), None);
        assert_eq!(engine.get("alpha"), None);
        let stats = engine.stats();
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn hit_increments_hits_exactly_once() {
        let engine = CacheEngine::new(4);
        engine.put("alpha".into(), "v".into(), Some(20)).unwrap();
        assert_eq!(engine.get("alpha"), Some("v".to_string()));
        assert_eq!(engine.stats().hits, 1);
    }

    #[test]
    fn capacity_never_exceeded() {
        let engine = CacheEngine::new(2);
        engine.put("a".into(), "1".into(), None).unwrap();
        engine.put("b".into(), "2".into(), None).unwrap();
        engine.put("c".into(), "3".into(), None).unwrap();
        assert!(engine.stats().current_size <= 2);
    }

    #[test]
    fn eviction_respects_recency() {
        let engine = CacheEngine::new(2);
        engine.put("a".into(), "1".into(), None).unwrap();
        engine.put("b".into(), "2".into(), None).unwrap();
        // touch "a" so "b" becomes the LRU victim
        engine.get("a");
        engine.put("c".into(), "3".into(), None).unwrap();
        assert_eq!(engine.get("b"), None);
        assert_eq!(engine.get("a"), Some("1".to_string()));
        assert_eq!(engine.get("c"), Some("3".to_string()));
    }

    #[test]
    fn purge_expired_removes_entries() {
        let engine = CacheEngine::new(4);
        engine.put("alpha".into(), "v".into(), Some(1)).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(engine.purge_expired(), 1);
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn clear_keeps_counters() {
        let engine = CacheEngine::new(4);
        engine.put("a".into(), "1".into(), None).unwrap();
        engine.get("a");
        engine.get("missing");
        engine.clear();
        assert_eq!(engine.len(), 0);
        let stats = engine.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn shutdown_rejects_future_puts() {
        let engine = CacheEngine::new(4);
        engine.shutdown();
        assert_eq!(
            engine.put("a".into(), "1".into(), None),
            Err(EngineError::Shutdown)
        );
    }

    #[test]
    fn snapshot_reports_ttl_remaining() {
        let engine = CacheEngine::new(4);
        engine.put("a".into(), "1".into(), Some(60)).unwrap();
        engine.put("b".into(), "2".into(), None).unwrap();
        let snap = engine.snapshot();
        let a = snap.iter().find(|e| e.key == "a").unwrap();
        let b = snap.iter().find(|e| e.key == "b").unwrap();
        assert!(a.ttl_remaining_seconds.unwrap() <= 60);
        assert_eq!(b.ttl_remaining_seconds, None);
    }

    proptest::proptest! {
        // Property 1 (spec §8): |entries| never exceeds capacity, for any
        // sequence of puts, non-expiring so eviction is the only thing
        // that can keep size bounded.
        #[test]
        fn capacity_never_exceeded_for_any_put_sequence(
            capacity in 1usize..8,
            keys in proptest::collection::vec(0usize..20, 0..200),
        ) {
            let engine = CacheEngine::new(capacity);
            for k in keys {
                engine.put(format!("k{k}"), "v".to_string(), None).unwrap();
                prop_assert!(engine.stats().current_size <= capacity);
            }
        }
    }
}
