//! # Node client
//!
//! Purpose: expose a compact async API for issuing requests to a single
//! node's HTTP surface (spec §4.3).
//!
//! ## Design principles
//! 1. **Facade**: `NodeClient` hides the `reqwest::Client` and URL-joining
//!    details behind named methods, one per node endpoint.
//! 2. **Fail fast**: a non-2xx response is surfaced as `NodeClientError`
//!    immediately rather than retried — retry policy belongs to the
//!    caller (the proxy's fan-out loop), not the client.
//! 3. **Borrowed inputs**: methods take `&str` keys/values to avoid forcing
//!    an allocation on every call.

use std::time::Duration;

use ringkv_common::dto::{
    CacheDeleteResponse, CacheGetResponse, CacheKeysResponse, CacheSetRequest,
    CacheStatsResponse, HealthResponse,
};

pub type NodeResult<T> = Result<T, NodeClientError>;

#[derive(Debug, thiserror::Error)]
pub enum NodeClientError {
    #[error("request to node failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("node returned not found")]
    NotFound,
    #[error("node replied with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// A thin async facade over one node's HTTP surface, used by the proxy for
/// read fall-through and replica fan-out.
pub struct NodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl NodeClient {
    /// `base_url` is the node's address, e.g. `http://127.0.0.1:9001`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> NodeResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(NodeClient { http, base_url: base_url.into() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /cache/{key}`. Returns `Ok(None)` on a 404, surfacing a real
    /// cache miss distinctly from a transport failure.
    pub async fn get(&self, key: &str) -> NodeResult<Option<CacheGetResponse>> {
        let resp = self.http.get(self.url(&format!("/cache/{key}"))).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp).await?;
        Ok(Some(resp.json().await?))
    }

    /// `POST /cache`.
    pub async fn put(&self, key: &str, value: &str, ttl: Option<u64>) -> NodeResult<()> {
        let body = CacheSetRequest { key: key.to_string(), value: value.to_string(), ttl };
        let resp = self.http.post(self.url("/cache")).json(&body).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// `DELETE /cache/{key}`.
    pub async fn delete(&self, key: &str) -> NodeResult<bool> {
        let resp = self.http.delete(self.url(&format!("/cache/{key}"))).send().await?;
        let resp = check_status(resp).await?;
        let body: CacheDeleteResponse = resp.json().await?;
        Ok(body.deleted)
    }

    /// `GET /cache/stats`.
    pub async fn stats(&self) -> NodeResult<CacheStatsResponse> {
        let resp = self.http.get(self.url("/cache/stats")).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// `GET /cache/keys`. Used by the proxy's live-key observer (`/debug/keys`).
    pub async fn keys(&self) -> NodeResult<CacheKeysResponse> {
        let resp = self.http.get(self.url("/cache/keys")).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// `GET /health`. Used by the membership liveness loop; a transport
    /// failure or non-2xx both count as "unhealthy" to the caller.
    pub async fn health(&self) -> NodeResult<HealthResponse> {
        let resp = self.http.get(self.url("/health")).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// `POST /admin/shutdown`. Used only by the chaos controller, which
    /// requires this capability to exist before it may terminate a node.
    pub async fn shutdown(&self) -> NodeResult<()> {
        let resp = self.http.post(self.url("/admin/shutdown")).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response) -> NodeResult<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(NodeClientError::NotFound);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(NodeClientError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let client = NodeClient::new("http://127.0.0.1:9001", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/cache/foo"), "http://127.0.0.1:9001/cache/foo");
    }
}
