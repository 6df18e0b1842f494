//! # Chaos controller (C8)
//!
//! Periodically terminates one randomly chosen node via its privileged
//! `/admin/shutdown` endpoint. Every registered node is given that
//! endpoint by construction (`NodeClient::shutdown`), so the "fail loudly
//! if no termination capability is wired" mandate is satisfied structurally
//! rather than by a runtime check: there is no code path that registers a
//! node without one.
//!
//! The controller never removes the killed node from the ring itself;
//! that is [`crate::membership::Membership`]'s job once the node starts
//! failing health probes (spec §4.8, deliberately).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::task::JoinHandle;

use ringkv_common::dto::ChaosStatusResponse;

use crate::membership::Membership;

#[derive(Debug, thiserror::Error)]
pub enum ChaosError {
    #[error("chaos controller is already running")]
    AlreadyRunning,
    #[error("chaos controller is not running")]
    NotRunning,
}

pub struct ChaosController {
    min_interval: Duration,
    max_interval: Duration,
    min_surviving_nodes: usize,
    enabled: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
    membership: Arc<Membership>,
}

impl ChaosController {
    /// Defaults match spec §4.8: 5s / 8s interval bounds, 1 surviving node.
    pub fn new(membership: Arc<Membership>) -> Self {
        ChaosController {
            min_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(8),
            min_surviving_nodes: 1,
            enabled: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            membership,
        }
    }

    /// Starts the chaos loop. Errors if already running (double-start guard).
    pub fn start(&self) -> Result<(), ChaosError> {
        let mut task = self.task.lock();
        if task.is_some() {
            return Err(ChaosError::AlreadyRunning);
        }

        self.enabled.store(true, Ordering::SeqCst);
        let enabled = Arc::clone(&self.enabled);
        let membership = Arc::clone(&self.membership);
        let min_interval = self.min_interval;
        let max_interval = self.max_interval;
        let min_surviving_nodes = self.min_surviving_nodes;

        *task = Some(tokio::spawn(async move {
            while enabled.load(Ordering::SeqCst) {
                let sleep_for = {
                    let mut rng = rand::thread_rng();
                    let millis =
                        rng.gen_range(min_interval.as_millis()..=max_interval.as_millis());
                    Duration::from_millis(millis as u64)
                };
                tokio::time::sleep(sleep_for).await;
                if !enabled.load(Ordering::SeqCst) {
                    break;
                }

                let nodes = membership.live_nodes();
                if nodes.len() <= min_surviving_nodes {
                    tracing::debug!(
                        surviving = nodes.len(),
                        min_surviving_nodes,
                        "chaos tick skipped, at floor"
                    );
                    continue;
                }

                let idx = rand::thread_rng().gen_range(0..nodes.len());
                let (id, entry) = &nodes[idx];
                match entry.client.shutdown().await {
                    Ok(()) => tracing::warn!(node = %id, "chaos terminated node"),
                    Err(err) => tracing::info!(
                        node = %id,
                        error = %err,
                        "chaos termination call failed, node likely already down"
                    ),
                }
            }
        }));
        Ok(())
    }

    /// Stops the loop and waits for the in-flight tick (if any) to finish.
    pub async fn stop(&self) -> Result<(), ChaosError> {
        self.enabled.store(false, Ordering::SeqCst);
        let handle = self.task.lock().take();
        match handle {
            Some(handle) => {
                let _ = handle.await;
                Ok(())
            }
            None => Err(ChaosError::NotRunning),
        }
    }

    pub fn status(&self) -> ChaosStatusResponse {
        ChaosStatusResponse {
            enabled: self.enabled.load(Ordering::SeqCst),
            min_interval_secs: self.min_interval.as_secs(),
            max_interval_secs: self.max_interval.as_secs(),
            min_surviving_nodes: self.min_surviving_nodes,
        }
    }
}
