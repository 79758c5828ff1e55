//! Error types for the realtime bridge

use thiserror::Error;

/// Errors that can occur while opening or reading the event stream
///
/// None of these reach the mounting context; the bridge logs them and closes.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success status
    #[error("Event stream returned status {0}")]
    UnexpectedStatus(u16),

    /// Reading a chunk of the response body failed
    #[error("Stream failed: {0}")]
    StreamFailed(String),
}
