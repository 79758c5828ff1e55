//! # Ashva Realtime Bridge
//!
//! Imperative shell around [`ashva_realtime_core`]: it opens the gateway's
//! `text/event-stream`, feeds frames through the bridge reducer and executes
//! the resulting invalidations against an injected query cache.
//!
//! ```text
//! ┌──────────────┐  GET /events/stream   ┌──────────────┐
//! │ RealtimeBridge│ ───────────────────▶ │   Gateway    │
//! │  (tokio task) │ ◀─── data: {...} ─── │              │
//! └──────┬───────┘                       └──────────────┘
//!        │ FrameDecoder → BridgeReducer → Effect::Invalidate
//!        ▼
//! ┌──────────────┐
//! │  QueryCache  │  invalidate(["admin","tickets"]) …
//! └──────────────┘
//! ```
//!
//! The bridge is best-effort. A missing token means no connection; a failed
//! connection, a malformed frame or a dropped stream ends quietly. Nothing is
//! surfaced to the mounting context and nothing is retried: a new mount is
//! the only way back to `Connecting`.
//!
//! ## Example
//!
//! ```no_run
//! use ashva_realtime_bridge::{BridgeConfig, InMemoryQueryCache, RealtimeBridge};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let cache = Arc::new(InMemoryQueryCache::new());
//! let bridge = RealtimeBridge::new(
//!     BridgeConfig::from_env(),
//!     cache.clone(),
//!     Arc::new(|| std::env::var("ASHVA_AUTH_TOKEN").ok()),
//! );
//!
//! if let Some(handle) = bridge.mount() {
//!     // ... later, when the owning view goes away
//!     let state = handle.unmount().await;
//!     println!("closed: {:?}", state.phase);
//! }
//! # }
//! ```

pub mod bridge;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;

// Re-export main types for convenience
pub use bridge::{BridgeHandle, RealtimeBridge};
pub use cache::{CachedQuery, InMemoryQueryCache};
pub use client::EventStreamClient;
pub use config::{BridgeConfig, EnvTokenProvider, ListenerConfig};
pub use error::BridgeError;
