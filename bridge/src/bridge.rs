//! Mounting, reading and unmounting a bridge session.
//!
//! A session is a single tokio task. It connects once, decodes frames as
//! chunks arrive, runs each frame through [`BridgeReducer`] and executes the
//! returned effects against the cache. The task ends on cancellation, on end
//! of stream, or on the first error; it never reconnects.

use crate::client::EventStreamClient;
use crate::config::BridgeConfig;
use crate::metrics;
use ashva_realtime_core::bridge::{
    BridgeAction, BridgeEnvironment, BridgePhase, BridgeReducer, BridgeState,
};
use ashva_realtime_core::effect::Effect;
use ashva_realtime_core::environment::{QueryCache, TokenProvider};
use ashva_realtime_core::policy::InvalidationPolicy;
use ashva_realtime_core::reducer::Reducer;
use ashva_realtime_core::sse::FrameDecoder;
use futures::StreamExt;
use std::pin::pin;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Connects the gateway event stream to a query cache.
///
/// The bridge itself is inert configuration; each [`mount`](Self::mount)
/// starts an independent session.
#[derive(Clone)]
pub struct RealtimeBridge {
    client: EventStreamClient,
    cache: Arc<dyn QueryCache>,
    tokens: Arc<dyn TokenProvider>,
    env: BridgeEnvironment,
}

impl RealtimeBridge {
    /// Create a bridge with the default invalidation policy.
    #[must_use]
    pub fn new(
        config: BridgeConfig,
        cache: Arc<dyn QueryCache>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client: EventStreamClient::new(&config),
            cache,
            tokens,
            env: BridgeEnvironment::default(),
        }
    }

    /// Replace the invalidation policy.
    #[must_use]
    pub fn with_policy(mut self, policy: InvalidationPolicy) -> Self {
        self.env.policy = policy;
        self
    }

    /// Replace the HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: EventStreamClient) -> Self {
        self.client = client;
        self
    }

    /// Start a session.
    ///
    /// The token is read exactly once. When it is absent or blank no request
    /// is made and `None` is returned. Outside a Tokio runtime the bridge
    /// also stays idle and returns `None`.
    #[must_use]
    pub fn mount(&self) -> Option<BridgeHandle> {
        let Some(token) = self
            .tokens
            .auth_token()
            .filter(|token| !token.trim().is_empty())
        else {
            debug!("No auth token, realtime bridge stays idle");
            return None;
        };

        let Ok(runtime) = Handle::try_current() else {
            warn!("No Tokio runtime, realtime bridge stays idle");
            return None;
        };

        let (cancel, cancel_rx) = watch::channel(false);
        let (phase_tx, phase) = watch::channel(BridgePhase::Idle);

        let session = Session {
            client: self.client.clone(),
            cache: Arc::clone(&self.cache),
            env: self.env.clone(),
            phase: phase_tx,
        };
        let task = runtime.spawn(session.run(token, cancel_rx));

        Some(BridgeHandle {
            cancel,
            phase,
            task,
        })
    }
}

/// Owner's handle on a running session.
///
/// Dropping the handle cancels the session without waiting for it.
#[derive(Debug)]
pub struct BridgeHandle {
    cancel: watch::Sender<bool>,
    phase: watch::Receiver<BridgePhase>,
    task: JoinHandle<BridgeState>,
}

impl BridgeHandle {
    /// Current phase of the session.
    #[must_use]
    pub fn phase(&self) -> BridgePhase {
        *self.phase.borrow()
    }

    /// Watch phase changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BridgePhase> {
        self.phase.clone()
    }

    /// Cancel the session and wait for it to stop.
    ///
    /// Once this returns no further invalidation is issued.
    pub async fn unmount(self) -> BridgeState {
        self.cancel.send_replace(true);
        join(self.task).await
    }

    /// Wait for the session to end on its own.
    pub async fn closed(self) -> BridgeState {
        let Self {
            cancel: _cancel,
            task,
            ..
        } = self;
        join(task).await
    }
}

async fn join(task: JoinHandle<BridgeState>) -> BridgeState {
    match task.await {
        Ok(state) => state,
        Err(error) => {
            warn!(%error, "Bridge session did not complete");
            BridgeState::default()
        },
    }
}

/// Resolves once cancellation is requested or the handle is dropped.
async fn cancelled(mut cancel: watch::Receiver<bool>) {
    let _ = cancel.wait_for(|cancelled| *cancelled).await;
}

struct Session {
    client: EventStreamClient,
    cache: Arc<dyn QueryCache>,
    env: BridgeEnvironment,
    phase: watch::Sender<BridgePhase>,
}

impl Session {
    async fn run(self, token: String, cancel: watch::Receiver<bool>) -> BridgeState {
        let mut state = BridgeState::default();
        self.apply(&mut state, BridgeAction::Connect);

        let connected = tokio::select! {
            biased;
            () = cancelled(cancel.clone()) => None,
            result = self.client.connect(&token) => Some(result),
        };

        let stream = match connected {
            None => {
                self.apply(&mut state, BridgeAction::Cancelled);
                return state;
            },
            Some(Err(error)) => {
                debug!(%error, url = self.client.events_url(), "Event stream unavailable");
                metrics::record_connection("failed");
                self.apply(&mut state, BridgeAction::ConnectFailed);
                return state;
            },
            Some(Ok(stream)) => {
                info!(url = self.client.events_url(), "Event stream connected");
                metrics::record_connection("connected");
                self.apply(&mut state, BridgeAction::Connected);
                stream
            },
        };

        let mut decoder = FrameDecoder::new();
        let mut chunks = pin!(stream.take_until(cancelled(cancel.clone())));

        let end = loop {
            match chunks.next().await {
                Some(Ok(bytes)) => {
                    for frame in decoder.push(&bytes) {
                        if *cancel.borrow() {
                            break;
                        }
                        self.apply(&mut state, BridgeAction::FrameReceived(frame));
                    }
                },
                Some(Err(error)) => {
                    debug!(%error, "Event stream read failed");
                    break BridgeAction::ReadFailed;
                },
                // The stream also reports stopped after a plain end of body,
                // so ask the signal itself
                None if *cancel.borrow() || cancel.has_changed().is_err() => {
                    break BridgeAction::Cancelled;
                },
                None => break BridgeAction::StreamEnded,
            }
        };

        let dropped = decoder.finish();
        if dropped > 0 {
            trace!(bytes = dropped, "Dropping unterminated frame");
        }

        self.apply(&mut state, end);
        debug!(phase = ?state.phase, stats = ?state.stats, "Bridge session finished");
        state
    }

    fn apply(&self, state: &mut BridgeState, action: BridgeAction) {
        let before = state.stats;
        let effects = BridgeReducer.reduce(state, action, &self.env);
        metrics::record_stats_delta(&before, &state.stats);

        for effect in effects {
            self.execute(effect);
        }

        let phase = state.phase;
        self.phase.send_if_modified(|current| {
            let changed = *current != phase;
            *current = phase;
            changed
        });
    }

    fn execute(&self, effect: Effect) {
        match effect {
            Effect::None => {},
            Effect::Invalidate(key) => {
                trace!(%key, "Invalidating");
                self.cache.invalidate(&key);
                metrics::record_invalidation();
            },
            Effect::Sequential(effects) => {
                for effect in effects {
                    self.execute(effect);
                }
            },
        }
    }
}
