//! # ringkv-common
//!
//! Shared error types and wire DTOs for the RingKV cache-node and proxy
//! binaries. Keeping these in one crate means the JSON shapes exchanged
//! between the proxy and its cache nodes, and between clients and the
//! proxy, are defined exactly once.

pub mod dto;
pub mod error;
pub mod time;

pub use error::{ApiError, ApiResult};
