//! Error types for the gateway.
//!
//! Request errors render as `{"detail": "..."}` bodies, the shape portal
//! clients already parse.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by gateway handlers and startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No `Authorization: Bearer` credential
    #[error("Missing bearer token")]
    MissingToken,

    /// Credential present but rejected
    #[error("Invalid token")]
    InvalidToken,

    /// Configuration could not be used
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The server failed while running
    #[error("Server error: {0}")]
    Server(String),
}

impl GatewayError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Config(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Internal gateway error");
        }

        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
