//! # Ashva Realtime Gateway
//!
//! Axum endpoint that streams gateway events to portal clients as
//! server-sent events.
//!
//! ```text
//! proxied write ──▶ EventHub::publish_mutation ──▶ broadcast
//!   (in process, or POST /api/v1/events/publish)      │
//!                                                     │
//!             GET /api/v1/events/stream  ◀────────────┘ (one receiver per client)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ashva_realtime_gateway::{EventHub, GatewayConfig, GatewayState, serve};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env();
//! let hub = EventHub::default();
//! let state = GatewayState::from_config(&config, hub.clone());
//!
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()?).await?;
//! tokio::spawn(serve(listener, state, async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }));
//!
//! hub.publish_mutation("tickets", "PATCH", "/api/v1/tickets/7", 200, None);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod state;

pub use auth::{StaticTokens, TokenValidator};
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use hub::EventHub;
pub use state::GatewayState;

use axum::{
    Router,
    routing::{get, post},
};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Path of the event stream.
pub const EVENTS_ROUTE: &str = "/api/v1/events/stream";

/// Path services post their writes to.
pub const PUBLISH_ROUTE: &str = "/api/v1/events/publish";

/// Build the gateway router.
#[must_use]
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route(EVENTS_ROUTE, get(handlers::event_stream))
        .route(PUBLISH_ROUTE, post(handlers::publish_event))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
///
/// On shutdown every open stream is ended so that in-flight connections can
/// drain.
///
/// # Errors
///
/// [`GatewayError::Server`] if the server fails.
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> Result<(), GatewayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Gateway listening");
    }

    let closer = state.clone();
    let signal = async move {
        shutdown.await;
        info!("Gateway shutting down");
        closer.close();
    };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| GatewayError::Server(e.to_string()))
}
