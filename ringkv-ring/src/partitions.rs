//! # Partition matrix
//!
//! A symmetric boolean relation over unordered node-port pairs (spec C5),
//! used only to shape the proxy's write fan-out (spec §4.5, §9): partitions
//! never affect reads or the backing-store write-through, and removing a
//! partition does not retroactively repair writes missed while it existed.

use std::collections::HashSet;

use parking_lot::Mutex;

/// Symmetric declared-partition set between node ports.
pub struct PartitionMatrix {
    pairs: Mutex<HashSet<(u16, u16)>>,
}

impl PartitionMatrix {
    pub fn new() -> Self {
        PartitionMatrix { pairs: Mutex::new(HashSet::new()) }
    }

    fn canonical(a: u16, b: u16) -> (u16, u16) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Declares a partition between `a` and `b`. Returns `false` if `a == b`
    /// (rejected by the caller as `BadRequest`, spec §7).
    pub fn create(&self, a: u16, b: u16) -> bool {
        if a == b {
            return false;
        }
        self.pairs.lock().insert(Self::canonical(a, b));
        true
    }

    /// Removes a previously declared partition. No-op if absent.
    pub fn remove(&self, a: u16, b: u16) -> bool {
        if a == b {
            return false;
        }
        self.pairs.lock().remove(&Self::canonical(a, b));
        true
    }

    /// Whether a partition is declared between `a` and `b`. Symmetric by
    /// construction: `has(a, b) == has(b, a)`.
    pub fn has(&self, a: u16, b: u16) -> bool {
        if a == b {
            return false;
        }
        self.pairs.lock().contains(&Self::canonical(a, b))
    }

    /// All declared partitions, each listed once as `(min, max)`.
    pub fn list(&self) -> Vec<(u16, u16)> {
        let mut pairs: Vec<(u16, u16)> = self.pairs.lock().iter().copied().collect();
        pairs.sort_unstable();
        pairs
    }
}

impl Default for PartitionMatrix {
    fn default() -> Self {
        Self::new()
    }
}
