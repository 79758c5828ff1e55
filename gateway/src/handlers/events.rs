//! Server-sent event stream of gateway events.
//!
//! # Endpoint
//!
//! ```text
//! GET /api/v1/events/stream
//! Authorization: Bearer <token>
//! ```
//!
//! # Stream
//!
//! ```text
//! event: ready
//! data: {}
//!
//! data: {"type":"tickets.changed","service":"tickets",...}
//!
//! : keep-alive
//! ```

use crate::auth::authorize;
use crate::error::GatewayError;
use crate::state::GatewayState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::{CACHE_CONTROL, HeaderName};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Stream every published event to an authenticated client.
///
/// # Errors
///
/// `401` with `{"detail": "Missing bearer token"}` or
/// `{"detail": "Invalid token"}`.
pub async fn event_stream(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    authorize(&headers, state.validator.as_ref()).inspect_err(|error| {
        debug!(%error, "Rejected event stream request");
    })?;

    let mut events = state.hub.subscribe();
    let mut closing = state.closing();
    metrics::counter!("gateway_streams_opened_total").increment(1);
    debug!(subscribers = state.hub.subscriber_count(), "Event stream opened");

    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(Event::default().event("ready").data("{}"));

        loop {
            let received = tokio::select! {
                biased;
                _ = closing.wait_for(|closing| *closing) => None,
                received = events.recv() => Some(received),
            };

            match received {
                None | Some(Err(RecvError::Closed)) => break,
                Some(Err(RecvError::Lagged(skipped))) => {
                    warn!(skipped, "Event stream lagging, skipped events");
                },
                Some(Ok(event)) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        yield Ok(Event::default().data(json));
                    },
                    Err(error) => warn!(%error, "Failed to serialize event"),
                },
            }
        }

        debug!("Event stream closed");
    };

    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.keep_alive)
            .text("keep-alive"),
    );

    Ok((
        [(CACHE_CONTROL, "no-cache"), (HeaderName::from_static("x-accel-buffering"), "no")],
        sse,
    ))
}
