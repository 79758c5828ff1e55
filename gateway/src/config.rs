//! Configuration management for the gateway.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Interval between `: keep-alive` comments unless configured otherwise.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Accepted bearer tokens
    pub tokens: Vec<String>,
    /// Keep-alive comment interval
    pub keep_alive: Duration,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// - `GATEWAY_HOST` (default `0.0.0.0`)
    /// - `GATEWAY_PORT` (default `8080`)
    /// - `GATEWAY_TOKENS`: comma separated, blanks dropped
    /// - `GATEWAY_KEEP_ALIVE_SECS` (default `15`)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("GATEWAY_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(8080),
            tokens: env::var("GATEWAY_TOKENS")
                .map(|tokens| parse_tokens(&tokens))
                .unwrap_or_default(),
            keep_alive: env::var("GATEWAY_KEEP_ALIVE_SECS")
                .ok()
                .and_then(|secs| secs.parse().ok())
                .filter(|secs| *secs > 0)
                .map_or(DEFAULT_KEEP_ALIVE, Duration::from_secs),
        }
    }

    /// Address to bind.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Config`] if host and port do not form a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, GatewayError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| GatewayError::Config(format!("bind address: {e}")))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tokens: Vec::new(),
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }
}

fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}
