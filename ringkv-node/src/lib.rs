//! Library half of the `ringkv-node` binary, split out so the HTTP surface
//! can be exercised in-process by integration tests (`tower::ServiceExt::oneshot`)
//! without binding a real socket.

pub mod http;
