//! starprobed — speed test measurement daemon.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use starprobe_core::config::StarprobeConfig;
use starprobe_services::{IpApiLookup, ProviderClassifier, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = StarprobeConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = StarprobeConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        StarprobeConfig::default()
    });

    tracing::info!(
        chunk_size = config.measurement.chunk_size_bytes,
        max_download = config.measurement.max_download_bytes,
        lookup = %config.provider.base_url,
        admins = config.access.admin_users.len(),
        "starprobed starting"
    );

    // Provider classification
    let timeout = Duration::from_millis(config.provider.timeout_ms);
    let lookup = IpApiLookup::new(config.provider.base_url.clone(), timeout)
        .context("failed to build provider lookup client")?;
    let classifier = ProviderClassifier::new(Arc::new(lookup), timeout);

    let bind = config.api.bind.clone();
    let port = config.api.port;
    let state = starprobe_api::ApiState {
        config: Arc::new(config),
        classifier,
        records: RecordStore::new(),
    };

    // ── Shutdown ─────────────────────────────────────────────────────────────
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown signal received");
    };

    starprobe_api::serve(state, &bind, port, shutdown).await?;
    tracing::info!("shutting down");
    Ok(())
}
