//! # Time helpers
//!
//! The cache engine (C1) measures TTLs against `Instant` (monotonic, process
//! local); the backing store (C2) measures them against wall-clock seconds
//! since it must remain meaningful across a proxy restart. This module holds
//! the one conversion point between the two.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as whole seconds since the Unix epoch.
pub fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Whether a record created at `created_at` with `ttl_seconds` (None = never
/// expires) is logically expired at `now`.
pub fn is_expired(created_at: u64, ttl_seconds: Option<u64>, now: u64) -> bool {
    match ttl_seconds {
        None => false,
        Some(ttl) => now.saturating_sub(created_at) >= ttl,
    }
}
