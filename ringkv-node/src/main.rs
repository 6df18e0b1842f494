//! # ringkv-node
//!
//! The cache-node binary: wraps a `ringkv_engine::CacheEngine` with the
//! HTTP surface spec §4.3 defines, plus the background expiry sweeper and
//! the privileged shutdown endpoint chaos (C8) relies on.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tower_http::trace::TraceLayer;

use ringkv_engine::{CacheEngine, SweeperHandle};
use ringkv_node::http::{self, AppState};

/// Cache node: a capacity-bounded, TTL-aware key/value store behind HTTP.
#[derive(Parser, Debug)]
#[command(name = "ringkv-node")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long)]
    port: u16,

    #[arg(long, default_value_t = 1000)]
    capacity: usize,

    #[arg(long, default_value_t = 1)]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("invalid host/port")?;

    let engine = Arc::new(CacheEngine::new(cli.capacity));
    let sweeper = SweeperHandle::spawn(
        Arc::clone(&engine),
        Duration::from_secs(cli.sweep_interval_secs),
    );

    let state = Arc::new(AppState {
        engine: Arc::clone(&engine),
        port: cli.port,
        shutdown: tokio::sync::Notify::new(),
    });

    let app = http::router(Arc::clone(&state)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, capacity = cli.capacity, "node listening");

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_state.shutdown.notified() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        })
        .await
        .context("server error")?;

    sweeper.stop().await;
    tracing::info!("node shut down cleanly");
    Ok(())
}
