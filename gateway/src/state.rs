//! Shared state for gateway handlers.

use crate::auth::{StaticTokens, TokenValidator};
use crate::config::{DEFAULT_KEEP_ALIVE, GatewayConfig};
use crate::hub::EventHub;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// State shared across all gateway handlers.
///
/// # Examples
///
/// ```
/// use ashva_realtime_gateway::{EventHub, GatewayState, StaticTokens};
/// use std::sync::Arc;
///
/// let state = GatewayState::new(EventHub::default(), Arc::new(StaticTokens::new(["secret"])));
/// assert!(!state.is_closing());
/// ```
#[derive(Clone)]
pub struct GatewayState {
    /// Event fan-out
    pub hub: EventHub,
    /// Accepts or rejects bearer tokens
    pub validator: Arc<dyn TokenValidator>,
    /// Keep-alive comment interval
    pub keep_alive: Duration,
    closing: Arc<watch::Sender<bool>>,
}

impl GatewayState {
    /// Create state with the default keep-alive interval.
    #[must_use]
    pub fn new(hub: EventHub, validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            hub,
            validator,
            keep_alive: DEFAULT_KEEP_ALIVE,
            closing: Arc::new(watch::channel(false).0),
        }
    }

    /// State for a loaded configuration, with its static tokens.
    #[must_use]
    pub fn from_config(config: &GatewayConfig, hub: EventHub) -> Self {
        Self::new(hub, Arc::new(StaticTokens::new(config.tokens.iter().cloned())))
            .with_keep_alive(config.keep_alive)
    }

    /// Override the keep-alive interval.
    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// End every open stream. New streams end right after their `ready`
    /// frame.
    pub fn close(&self) {
        self.closing.send_replace(true);
    }

    /// Whether [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        *self.closing.borrow()
    }

    /// Resolves once the gateway is closing.
    pub(crate) fn closing(&self) -> watch::Receiver<bool> {
        self.closing.subscribe()
    }
}
