//! Headless realtime listener.
//!
//! Connects to the gateway event stream with `ASHVA_AUTH_TOKEN` and logs the
//! cache invalidations each event would trigger. Stops on Ctrl+C or when the
//! stream closes.

use ashva_realtime_bridge::metrics::MetricsServer;
use ashva_realtime_bridge::{EnvTokenProvider, ListenerConfig, RealtimeBridge};
use ashva_realtime_core::environment::QueryCache;
use ashva_realtime_core::key::QueryKey;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Cache stand-in that only reports what would be invalidated.
struct LoggingCache;

impl QueryCache for LoggingCache {
    fn invalidate(&self, prefix: &QueryKey) {
        info!(key = %prefix, "Invalidate");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ashva_realtime_bridge=info,ashva_realtime_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ListenerConfig::from_env();
    info!(url = %config.bridge.events_url(), "Starting realtime listener");

    if let Some(addr) = config.metrics_addr {
        MetricsServer::new(addr).start()?;
    }

    let bridge = RealtimeBridge::new(
        config.bridge,
        Arc::new(LoggingCache),
        Arc::new(EnvTokenProvider::default()),
    );

    let Some(handle) = bridge.mount() else {
        warn!("ASHVA_AUTH_TOKEN is not set, nothing to listen to");
        return Ok(());
    };

    let mut phase = handle.subscribe();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
        _ = phase.wait_for(|phase| phase.is_closed()) => {},
    }

    let state = handle.unmount().await;
    info!(
        phase = ?state.phase,
        frames = state.stats.frames,
        events = state.stats.events,
        invalidations = state.stats.invalidations,
        "Realtime listener stopped"
    );

    Ok(())
}
