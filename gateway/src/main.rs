//! Standalone realtime gateway.
//!
//! Serves the event stream with the tokens from `GATEWAY_TOKENS`. Services
//! report their writes to `POST /api/v1/events/publish` with the same
//! tokens; every qualifying write is streamed to the open listeners.

use ashva_realtime_gateway::{EventHub, GatewayConfig, GatewayState, serve};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ashva_realtime_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();
    if config.tokens.is_empty() {
        warn!("GATEWAY_TOKENS is empty, every stream request will be rejected");
    }

    let state = GatewayState::from_config(&config, EventHub::default());
    let listener = tokio::net::TcpListener::bind(config.bind_addr()?).await?;

    serve(listener, state, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C");
        }
    })
    .await?;

    Ok(())
}
