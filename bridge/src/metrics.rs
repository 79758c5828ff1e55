//! Prometheus metrics for the realtime bridge.
//!
//! Counters are recorded through the `metrics` facade and are no-ops until a
//! recorder is installed. The listener installs one when `METRICS_ADDR` is set.
//!
//! # Example
//!
//! ```rust,no_run
//! use ashva_realtime_bridge::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Serve metrics on port 9090
//! MetricsServer::new("0.0.0.0:9090".parse()?).start()?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use ashva_realtime_core::bridge::BridgeStats;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install the exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus scrape endpoint.
pub struct MetricsServer {
    addr: SocketAddr,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Install the global recorder and start serving `/metrics`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if a recorder is already installed or
    /// the listener cannot bind.
    pub fn start(&self) -> Result<(), MetricsError> {
        PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .install()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_metrics();
        tracing::info!(addr = %self.addr, "Metrics server started");
        Ok(())
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "realtime_connections_total",
        "Stream connection attempts by outcome"
    );
    describe_counter!(
        "realtime_frames_received_total",
        "Frames decoded from the event stream"
    );
    describe_counter!(
        "realtime_events_dispatched_total",
        "Events that produced invalidations"
    );
    describe_counter!(
        "realtime_heartbeats_total",
        "Empty keep-alive payloads received"
    );
    describe_counter!(
        "realtime_frames_discarded_total",
        "Frames dropped without dispatch, by reason"
    );
    describe_counter!(
        "realtime_invalidations_total",
        "Cache invalidations issued"
    );
}

/// Count a connection attempt.
pub fn record_connection(outcome: &'static str) {
    counter!("realtime_connections_total", "outcome" => outcome).increment(1);
}

/// Count an executed invalidation.
pub fn record_invalidation() {
    counter!("realtime_invalidations_total").increment(1);
}

/// Record what changed between two snapshots of the bridge counters.
pub fn record_stats_delta(before: &BridgeStats, after: &BridgeStats) {
    counter!("realtime_frames_received_total").increment(after.frames - before.frames);
    counter!("realtime_events_dispatched_total").increment(after.events - before.events);
    counter!("realtime_heartbeats_total").increment(after.heartbeats - before.heartbeats);
    counter!("realtime_frames_discarded_total", "reason" => "no_data")
        .increment(after.skipped - before.skipped);
    counter!("realtime_frames_discarded_total", "reason" => "malformed")
        .increment(after.malformed - before.malformed);
}
