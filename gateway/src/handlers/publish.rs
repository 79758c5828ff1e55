//! Announcing a completed write to every open stream.
//!
//! Services that sit behind the gateway report their writes here when they
//! are not embedded in the same process as the [`EventHub`](crate::EventHub).
//!
//! ```text
//! POST /api/v1/events/publish
//! Authorization: Bearer <token>
//!
//! {"service":"tickets","method":"PATCH","path":"/api/v1/tickets/7","status_code":200}
//! ```

use crate::auth::authorize;
use crate::error::GatewayError;
use crate::state::GatewayState;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A proxied write, as seen by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    /// Service that handled the write
    pub service: String,
    /// HTTP method of the write
    pub method: String,
    /// Request path
    pub path: String,
    /// Response status of the write
    pub status_code: u16,
    /// Optional payload forwarded to listeners
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Outcome of a publish request.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishResponse {
    /// Whether the write qualified as a mutation and was broadcast
    pub published: bool,
}

/// Broadcast a mutation event for a reported write.
///
/// Writes that do not qualify (reads, failed responses) are accepted and
/// ignored.
///
/// # Errors
///
/// `401` when the bearer token is missing or rejected.
pub async fn publish_event(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(request): Json<PublishRequest>,
) -> Result<(StatusCode, Json<PublishResponse>), GatewayError> {
    authorize(&headers, state.validator.as_ref()).inspect_err(|error| {
        debug!(%error, "Rejected publish request");
    })?;

    let published = state.hub.publish_mutation(
        &request.service,
        &request.method,
        &request.path,
        request.status_code,
        request.data,
    );

    Ok((StatusCode::ACCEPTED, Json(PublishResponse { published })))
}
