//! # Ashva Realtime Testing
//!
//! Testing utilities for the realtime event bridge.
//!
//! This crate provides:
//! - Recording implementations of the environment traits
//! - Stream fixtures for building `text/event-stream` bodies
//! - Property-based testing strategies for chunk splits
//! - A Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```
//! use ashva_realtime_testing::{RecordingCache, helpers::replay_stream, fixtures};
//!
//! let body = fixtures::data_frame(r#"{"service":"tickets"}"#);
//! let cache = RecordingCache::new();
//! replay_stream(&[body.as_bytes()], &cache);
//! assert_eq!(cache.call_count(), 5);
//! ```

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Recording implementations of the environment traits
pub mod mocks {
    use ashva_realtime_core::environment::{QueryCache, TokenProvider};
    use ashva_realtime_core::key::QueryKey;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    /// Query cache that records every invalidation call.
    ///
    /// # Example
    ///
    /// ```
    /// use ashva_realtime_testing::RecordingCache;
    /// use ashva_realtime_core::environment::QueryCache;
    /// use ashva_realtime_core::key::QueryKey;
    ///
    /// let cache = RecordingCache::new();
    /// cache.invalidate(&QueryKey::from(["tickets"]));
    /// assert_eq!(cache.calls(), vec![QueryKey::from(["tickets"])]);
    /// ```
    #[derive(Clone, Debug, Default)]
    pub struct RecordingCache {
        calls: Arc<Mutex<Vec<QueryKey>>>,
    }

    impl RecordingCache {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every prefix invalidated so far, in call order
        #[must_use]
        pub fn calls(&self) -> Vec<QueryKey> {
            self.calls.lock().unwrap().clone()
        }

        /// Number of invalidation calls
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Distinct prefixes invalidated so far
        #[must_use]
        pub fn key_set(&self) -> HashSet<QueryKey> {
            self.calls.lock().unwrap().iter().cloned().collect()
        }

        /// Forget recorded calls (for test isolation)
        pub fn clear(&self) {
            self.calls.lock().unwrap().clear();
        }

        /// Poll until at least `count` calls were recorded.
        ///
        /// Returns `false` if `timeout` elapses first.
        pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
            let deadline = Instant::now() + timeout;
            while self.call_count() < count {
                if Instant::now() >= deadline {
                    return false;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            true
        }
    }

    impl QueryCache for RecordingCache {
        fn invalidate(&self, prefix: &QueryKey) {
            self.calls.lock().unwrap().push(prefix.clone());
        }
    }

    /// Token provider returning a fixed value and counting reads.
    #[derive(Clone, Debug, Default)]
    pub struct FixedToken {
        token: Option<String>,
        reads: Arc<AtomicUsize>,
    }

    impl FixedToken {
        /// Signed-in provider
        #[must_use]
        pub fn new(token: impl Into<String>) -> Self {
            Self {
                token: Some(token.into()),
                reads: Arc::default(),
            }
        }

        /// Signed-out provider
        #[must_use]
        pub fn none() -> Self {
            Self::default()
        }

        /// How many times the token was read
        #[must_use]
        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl TokenProvider for FixedToken {
        fn auth_token(&self) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.token.clone()
        }
    }
}

/// Builders for `text/event-stream` bodies
pub mod fixtures {
    use ashva_realtime_core::event::GatewayEvent;
    use ashva_realtime_core::sse::{encode_comment, encode_data_frame};

    /// One `data:` frame; multi-line payloads become multiple `data:` lines.
    #[must_use]
    pub fn data_frame(payload: &str) -> String {
        encode_data_frame(None, payload)
    }

    /// Named frame (`event:` + `data:`)
    #[must_use]
    pub fn named_frame(event: &str, payload: &str) -> String {
        encode_data_frame(Some(event), payload)
    }

    /// The hello frame the gateway sends on connect
    #[must_use]
    pub fn ready_frame() -> String {
        named_frame("ready", "{}")
    }

    /// Comment frame (`: keep-alive`)
    #[must_use]
    pub fn comment(text: &str) -> String {
        encode_comment(text)
    }

    /// Frame carrying a serialized event
    #[must_use]
    pub fn event_frame(event: &GatewayEvent) -> String {
        data_frame(&serde_json::to_string(event).unwrap())
    }

    /// Event with the given service and type
    #[must_use]
    pub fn event(service: Option<&str>, kind: Option<&str>) -> GatewayEvent {
        GatewayEvent {
            service: service.map(str::to_owned),
            kind: kind.map(str::to_owned),
            ..GatewayEvent::default()
        }
    }

    /// Split `bytes` at sorted `cuts` (cut points may repeat).
    #[must_use]
    pub fn split_at(bytes: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
        let mut chunks = Vec::with_capacity(cuts.len() + 1);
        let mut last = 0;
        for &cut in cuts {
            let cut = cut.clamp(last, bytes.len());
            chunks.push(bytes[last..cut].to_vec());
            last = cut;
        }
        chunks.push(bytes[last..].to_vec());
        chunks
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use super::fixtures;
    use proptest::prelude::*;

    /// Sorted cut points into a body of `len` bytes
    pub fn cut_points(len: usize) -> impl Strategy<Value = Vec<usize>> {
        proptest::collection::vec(0..=len, 0..16).prop_map(|mut cuts| {
            cuts.sort_unstable();
            cuts
        })
    }

    /// Every way of splitting `body` into chunks
    pub fn chunked(body: Vec<u8>) -> impl Strategy<Value = Vec<Vec<u8>>> {
        cut_points(body.len()).prop_map(move |cuts| fixtures::split_at(&body, &cuts))
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use super::mocks::RecordingCache;
    use ashva_realtime_core::bridge::{
        BridgeAction, BridgeEnvironment, BridgePhase, BridgeReducer, BridgeState,
    };
    use ashva_realtime_core::effect::Effect;
    use ashva_realtime_core::environment::QueryCache;
    use ashva_realtime_core::reducer::Reducer;
    use ashva_realtime_core::sse::FrameDecoder;

    /// Install a test subscriber honouring `RUST_LOG` (idempotent).
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// Feed `chunks` through a decoder and a streaming bridge reducer,
    /// applying invalidations to `cache`. Returns the final state.
    pub fn replay_stream(chunks: &[&[u8]], cache: &RecordingCache) -> BridgeState {
        let env = BridgeEnvironment::default();
        let mut state = BridgeState {
            phase: BridgePhase::Streaming,
            ..BridgeState::default()
        };
        let mut decoder = FrameDecoder::new();

        for chunk in chunks {
            for frame in decoder.push(chunk) {
                let effects =
                    BridgeReducer.reduce(&mut state, BridgeAction::FrameReceived(frame), &env);
                for key in effects.iter().flat_map(Effect::invalidated_keys) {
                    cache.invalidate(key);
                }
            }
        }

        state
    }
}

// Re-export commonly used items
pub use mocks::{FixedToken, RecordingCache};
