//! Liveness endpoint.

use crate::state::GatewayState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

/// Liveness report.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Health {
    /// Always `"ok"` while the process serves requests
    pub status: &'static str,
    /// Open event streams
    pub subscribers: usize,
    /// Whether shutdown has started
    pub closing: bool,
}

/// `GET /health`: does not require a token.
#[allow(clippy::unused_async)]
pub async fn health_check(State(state): State<GatewayState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        subscribers: state.hub.subscriber_count(),
        closing: state.is_closing(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventHub, StaticTokens};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reports_subscribers() {
        let state = GatewayState::new(EventHub::default(), Arc::new(StaticTokens::default()));
        let _rx = state.hub.subscribe();

        let Json(health) = health_check(State(state)).await;
        assert_eq!(
            health,
            Health {
                status: "ok",
                subscribers: 1,
                closing: false,
            }
        );
    }
}
