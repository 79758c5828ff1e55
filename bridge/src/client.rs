//! HTTP client for the gateway event stream

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::ACCEPT;
use std::pin::Pin;

/// Chunks of the response body as they arrive.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BridgeError>> + Send>>;

/// Opens `GET {api_base}/events/stream`.
#[derive(Clone, Debug)]
pub struct EventStreamClient {
    client: Client,
    events_url: String,
}

impl EventStreamClient {
    /// Create a client for the configured API.
    ///
    /// No request or read timeout is applied: the stream is expected to stay
    /// open until the bridge is unmounted.
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Create a client reusing an existing connection pool.
    #[must_use]
    pub fn with_client(client: Client, config: &BridgeConfig) -> Self {
        Self {
            client,
            events_url: config.events_url(),
        }
    }

    /// The URL this client connects to.
    #[must_use]
    pub fn events_url(&self) -> &str {
        &self.events_url
    }

    /// Open the stream with `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::RequestFailed`] if no response arrives
    /// - [`BridgeError::UnexpectedStatus`] for a non-success status
    ///
    /// Individual stream items carry [`BridgeError::StreamFailed`] if a read
    /// fails mid-stream.
    pub async fn connect(&self, token: &str) -> Result<ByteStream, BridgeError> {
        let response = self
            .client
            .get(&self.events_url)
            .bearer_auth(token)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| BridgeError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::UnexpectedStatus(status.as_u16()));
        }

        Ok(Box::pin(response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| BridgeError::StreamFailed(e.to_string()))
        })))
    }
}
