//! Library half of the `ringkv-proxy` binary, split out so the HTTP surface
//! can be exercised in-process by integration tests, the same way
//! `ringkv-node` exposes its router for `tower::ServiceExt::oneshot`.

pub mod chaos;
pub mod data;
pub mod http;
pub mod membership;
pub mod observability;
pub mod state;
