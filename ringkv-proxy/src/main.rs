//! # ringkv-proxy
//!
//! The proxy coordinator binary: routing, replication, the consistent-hash
//! ring, the partition matrix, membership/liveness, the chaos controller,
//! and the observability surface, all fronted by one HTTP API (spec §6).

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tower_http::trace::TraceLayer;

use ringkv_store::BackingStore;

use ringkv_proxy::http;
use ringkv_proxy::state::{AppState, ProxyConfig};

/// Proxy coordinator: routes client requests across a dynamic set of cache
/// nodes using consistent hashing, with write-through persistence.
#[derive(Parser, Debug)]
#[command(name = "ringkv-proxy")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long)]
    port: u16,

    #[arg(long)]
    db: PathBuf,
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

    let store = BackingStore::open(&cli.db)
        .with_context(|| format!("failed to open backing store at {}", cli.db.display()))?;
    let state = AppState::new(store, ProxyConfig::default());

    let health_state = std::sync::Arc::clone(&state);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(health_state.config.health_check_period);
        loop {
            ticker.tick().await;
            health_state.membership.health_tick().await;
        }
    });

    let app = http::router(std::sync::Arc::clone(&state)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, db = %cli.db.display(), "proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    tracing::info!("proxy shut down cleanly");
    Ok(())
}
