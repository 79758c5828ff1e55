//! Configuration management for the realtime bridge.
//!
//! Loads configuration from environment variables with sensible defaults.

use ashva_realtime_core::environment::TokenProvider;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

/// API base used when `ASHVA_API_URL` is unset.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api/v1";

/// Path of the event stream below the API base.
pub const EVENTS_PATH: &str = "/events/stream";

/// Environment variable holding the API base URL.
pub const API_URL_VAR: &str = "ASHVA_API_URL";

/// Environment variable the listener reads its bearer token from.
pub const AUTH_TOKEN_VAR: &str = "ASHVA_AUTH_TOKEN";

/// Where the bridge connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// API base URL, without trailing slash
    pub api_base: String,
}

impl BridgeConfig {
    /// Configuration for an explicit API base.
    #[must_use]
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `ASHVA_API_URL` falls back to [`DEFAULT_API_BASE`] when unset or blank.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            env::var(API_URL_VAR)
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        )
    }

    /// Full URL of the event stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use ashva_realtime_bridge::BridgeConfig;
    ///
    /// let config = BridgeConfig::new("https://api.example.test/api/v1/");
    /// assert_eq!(config.events_url(), "https://api.example.test/api/v1/events/stream");
    /// ```
    #[must_use]
    pub fn events_url(&self) -> String {
        format!("{}{EVENTS_PATH}", self.api_base)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

/// Settings of the `ashva-realtime-listen` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Stream location
    pub bridge: BridgeConfig,
    /// Prometheus endpoint (`METRICS_ADDR`), disabled when unset or invalid
    pub metrics_addr: Option<SocketAddr>,
}

impl ListenerConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bridge: BridgeConfig::from_env(),
            metrics_addr: env::var("METRICS_ADDR")
                .ok()
                .and_then(|addr| addr.parse().ok()),
        }
    }
}

/// Reads the bearer token from an environment variable on each call.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    /// Provider backed by `var`.
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(AUTH_TOKEN_VAR)
    }
}

impl TokenProvider for EnvTokenProvider {
    fn auth_token(&self) -> Option<String> {
        env::var(&self.var)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}
