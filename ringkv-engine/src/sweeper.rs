//! # Background expiry sweeper
//!
//! Runs `CacheEngine::purge_expired` on a fixed interval (default 1s, spec
//! §4.1) so memory held by expired entries is reclaimed even for keys that
//! are never read again. Lazy-on-access expiry alone would leak such keys
//! forever.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::engine::CacheEngine;

/// Handle to a running sweeper task. Dropping this without calling `stop`
/// leaves the sweeper running in the background for the engine's lifetime,
/// which is fine for a long-lived node process but tests should call
/// `stop` to avoid leaking tasks.
pub struct SweeperHandle {
    stop: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Spawns a sweeper that calls `engine.purge_expired()` every `interval`.
    pub fn spawn(engine: Arc<CacheEngine>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            Duration::from_millis(1)
        } else {
            interval
        };
        let stop = Arc::new(AtomicBool::new(false));
        let stop_task = Arc::clone(&stop);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                if stop_task.load(Ordering::Acquire) {
                    break;
                }
                let removed = engine.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, "expiry sweep removed entries");
                }
            }
        });

        SweeperHandle { stop, join }
    }

    /// Signals the sweeper to stop and waits for it to exit.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Release);
        let _ = self.join.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweeper_removes_expired_entries() {
        let engine = Arc::new(CacheEngine::new(4));
        engine.put("a".into(), "1".into(), Some(1)).unwrap();

        let handle = SweeperHandle::spawn(Arc::clone(&engine), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(1300)).await;
        handle.stop().await;

        assert_eq!(engine.len(), 0);
    }
}
