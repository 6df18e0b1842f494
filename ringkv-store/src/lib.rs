//! # ringkv-store
//!
//! The durable backing store (spec C2): write-through authoritative
//! storage and miss-fallback for the proxy. Built on `sled`, an embedded
//! KV store, so the proxy's `--db` flag names a single on-disk path with
//! no separate database process to run or configure.
//!
//! The store is owned exclusively by the proxy process (spec §5); internal
//! locking is `sled`'s responsibility, so this wrapper does not add its
//! own lock.

use ringkv_common::time::{is_expired, unix_now_secs};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backing store I/O error: {0}")]
    Io(#[from] sled::Error),
    #[error("corrupt record for key {key:?}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    value: String,
    ttl_seconds: Option<u64>,
    created_at: u64,
}

/// Durable key/value persistence backing the proxy's write-through and
/// read-fallback paths.
pub struct BackingStore {
    tree: sled::Db,
}

impl BackingStore {
    /// Opens (creating if absent) the backing store at `path`.
    pub fn open(path: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        let tree = sled::open(path)?;
        Ok(BackingStore { tree })
    }

    /// Upserts `key`; `created_at` becomes now.
    pub fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> StoreResult<()> {
        let record = StoredRecord {
            value: value.to_string(),
            ttl_seconds,
            created_at: unix_now_secs(),
        };
        let bytes = serde_json::to_vec(&record).expect("StoredRecord always serializes");
        self.tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Returns `(value, remaining_ttl_seconds)` if a live row exists. The
    /// returned TTL is what's left of the row's original lifetime, not the
    /// lifetime it was written with, so a cache repopulated from this value
    /// expires no later than the authoritative row does. A row past its TTL
    /// is treated as absent and best-effort deleted.
    pub fn get(&self, key: &str) -> StoreResult<Option<(String, Option<u64>)>> {
        let Some(bytes) = self.tree.get(key.as_bytes())? else {
            return Ok(None);
        };
        let record: StoredRecord = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;

        let now = unix_now_secs();
        if is_expired(record.created_at, record.ttl_seconds, now) {
            let _ = self.tree.remove(key.as_bytes());
            return Ok(None);
        }

        let remaining_ttl = record
            .ttl_seconds
            .map(|ttl| ttl.saturating_sub(now.saturating_sub(record.created_at)));
        Ok(Some((record.value, remaining_ttl)))
    }

    /// Removes `key` if present.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        self.tree.remove(key.as_bytes())?;
        Ok(())
    }

    /// Number of rows currently stored (including any not-yet-swept expired
    /// rows — the contract only requires lazy expiry on `get`).
    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.tree.len())
    }

    /// Removes all rows.
    pub fn clear(&self) -> StoreResult<()> {
        self.tree.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (BackingStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = BackingStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn set_then_get_roundtrips() {
        let (store, _dir) = temp_store();
        store.set("k1", "v1", None).unwrap();
        assert_eq!(store.get("k1").unwrap(), Some(("v1".to_string(), None)));
    }

    #[test]
    fn get_missing_is_none() {
        let (store, _dir) = temp_store();
        assert_eq!(store.get("absent").unwrap(), None);
    }

    #[test]
    fn expired_row_reads_as_absent_and_is_deleted() {
        let (store, _dir) = temp_store();
        store.set("k1", "v1", Some(0)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(store.get("k1").unwrap(), None);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn delete_removes_row() {
        let (store, _dir) = temp_store();
        store.set("k1", "v1", None).unwrap();
        store.delete("k1").unwrap();
        assert_eq!(store.get("k1").unwrap(), None);
    }

    #[test]
    fn clear_empties_store() {
        let (store, _dir) = temp_store();
        store.set("a", "1", None).unwrap();
        store.set("b", "2", None).unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn visible_within_same_process_immediately() {
        let (store, _dir) = temp_store();
        store.set("k", "v", Some(60)).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(("v".to_string(), Some(60))));
    }

    #[test]
    fn get_returns_remaining_ttl_not_original() {
        let (store, _dir) = temp_store();
        store.set("k", "v", Some(5)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2100));
        let (_, ttl) = store.get("k").unwrap().unwrap();
        let ttl = ttl.unwrap();
        assert!(ttl < 5, "expected remaining ttl below original 5s, got {ttl}");
        assert!(ttl >= 1, "elapsed only ~2s, remaining should still be around 3s, got {ttl}");
    }
}
