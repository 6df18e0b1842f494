//! # ringkv-client
//!
//! A lightweight async client for a single node's HTTP surface (spec C3),
//! used by the proxy to fan writes out to replicas and to read through to
//! a specific node. Keeps the facade shape of a hand-rolled sync client —
//! pooling and protocol details hidden behind a small, borrow-friendly API
//! — but built on `reqwest` so every call is a plain `async fn`.

mod client;

pub use client::{NodeClient, NodeClientError, NodeResult};
