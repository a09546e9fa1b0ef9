//! # Oak Ops Gateway binary
//!
//! Konfigurasi lewat environment (lihat `oak_ops_gateway::config`),
//! log level lewat `RUST_LOG` (default `info`).

use std::sync::Arc;

use anyhow::Context;
use oak_ops_gateway::{
    router, AppState, GatewayConfig, GatewayMetrics, SnapshotResolver, UpstreamCache,
    UpstreamClient,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    info!(
        mode = %config.mode,
        upstream = %config.upstream_base,
        cluster_id = %config.cluster_id,
        cache_ttl_ms = config.cache_ttl_ms,
        timeout_ms = config.upstream_timeout_ms,
        "ops gateway starting"
    );

    let cache = Arc::new(UpstreamCache::new(config.cache_ttl_ms, config.cache_max_entries));
    let metrics = Arc::new(GatewayMetrics::new());
    let upstream = UpstreamClient::new(
        &config.upstream_base,
        config.upstream_timeout(),
        cache,
        metrics,
    )
    .context("failed to build upstream client")?;
    let resolver = SnapshotResolver::new(upstream, config.chain_mode.clone());

    let addr = config.listen_addr();
    let app = router(AppState::new(config, resolver));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(listen_addr = %addr, "ops gateway listening");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!(error = %e, "server error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("ops gateway shutdown complete");
    Ok(())
}
