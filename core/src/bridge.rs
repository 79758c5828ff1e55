//! The bridge state machine.
//!
//! ```text
//! Idle ──Connect──▶ Connecting ──Connected──▶ Streaming
//!                       │                         │
//!          ConnectFailed│ Cancelled   StreamEnded │ ReadFailed │ Cancelled
//!                       ▼                         ▼
//!                              Closed(reason)
//! ```
//!
//! Nothing leaves `Closed`. A connection that drops stays closed until the
//! owning context mounts a new bridge.

use crate::effect::Effect;
use crate::event::GatewayEvent;
use crate::policy::InvalidationPolicy;
use crate::reducer::Reducer;
use crate::sse::Frame;
use smallvec::{SmallVec, smallvec};
use tracing::{debug, trace};

/// Why a bridge stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The owner unmounted the bridge
    Cancelled,
    /// The server ended the response body
    StreamEnded,
    /// Reading a chunk failed mid-stream
    ReadFailed,
    /// The request failed or returned a non-success status
    ConnectFailed,
}

/// Lifecycle phase of a mounted bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BridgePhase {
    /// Not connected (no token, or not yet started)
    #[default]
    Idle,
    /// Request in flight
    Connecting,
    /// Reading the event stream
    Streaming,
    /// Terminal
    Closed(CloseReason),
}

impl BridgePhase {
    /// Whether the phase is terminal.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

/// Frame accounting for one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Frames received while streaming
    pub frames: u64,
    /// Frames that produced an event
    pub events: u64,
    /// Empty payloads (`{}`)
    pub heartbeats: u64,
    /// Frames without a `data:` line
    pub skipped: u64,
    /// Payloads that failed to decode
    pub malformed: u64,
    /// Invalidations requested
    pub invalidations: u64,
}

/// Bridge state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeState {
    /// Current phase
    pub phase: BridgePhase,
    /// Counters
    pub stats: BridgeStats,
}

/// Inputs to the bridge reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeAction {
    /// Start connecting
    Connect,
    /// The stream response arrived
    Connected,
    /// The request failed
    ConnectFailed,
    /// A complete frame was decoded
    FrameReceived(Frame),
    /// The response body ended
    StreamEnded,
    /// A chunk read failed
    ReadFailed,
    /// The owner cancelled
    Cancelled,
}

/// Dependencies of the bridge reducer.
#[derive(Debug, Clone, Default)]
pub struct BridgeEnvironment {
    /// Event → keys routing
    pub policy: InvalidationPolicy,
}

/// Drives [`BridgeState`] and turns events into invalidation effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeReducer;

impl BridgeReducer {
    fn receive_frame(
        state: &mut BridgeState,
        frame: &Frame,
        env: &BridgeEnvironment,
    ) -> SmallVec<[Effect; 4]> {
        state.stats.frames += 1;

        let Some(payload) = frame.data() else {
            state.stats.skipped += 1;
            trace!(comment = frame.is_comment(), "Skipping frame without data");
            return SmallVec::new();
        };

        let event = match GatewayEvent::parse(&payload) {
            Ok(Some(event)) => event,
            Ok(None) => {
                state.stats.heartbeats += 1;
                trace!(event = ?frame.event_name(), "Heartbeat");
                return SmallVec::new();
            },
            Err(error) => {
                state.stats.malformed += 1;
                debug!(%error, "Discarding malformed frame");
                return SmallVec::new();
            },
        };

        let keys = env.policy.keys_for(&event);
        if keys.is_empty() {
            return SmallVec::new();
        }

        state.stats.events += 1;
        state.stats.invalidations += keys.len() as u64;
        debug!(
            event_type = ?event.kind,
            service = ?event.service,
            keys = keys.len(),
            "Dispatching event"
        );

        smallvec![Effect::chain(keys.into_iter().map(Effect::Invalidate).collect())]
    }
}

impl Reducer for BridgeReducer {
    type State = BridgeState;
    type Action = BridgeAction;
    type Environment = BridgeEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect; 4]> {
        use BridgePhase::{Closed, Connecting, Idle, Streaming};

        let next = match (state.phase, action) {
            (Idle, BridgeAction::Connect) => Connecting,
            (Connecting, BridgeAction::Connected) => Streaming,
            (Connecting, BridgeAction::ConnectFailed) => Closed(CloseReason::ConnectFailed),
            (Connecting | Streaming, BridgeAction::Cancelled) => Closed(CloseReason::Cancelled),
            (Streaming, BridgeAction::StreamEnded) => Closed(CloseReason::StreamEnded),
            (Streaming, BridgeAction::ReadFailed) => Closed(CloseReason::ReadFailed),
            (Streaming, BridgeAction::FrameReceived(frame)) => {
                return Self::receive_frame(state, &frame, env);
            },
            (phase, action) => {
                trace!(?phase, ?action, "Ignoring action");
                return SmallVec::new();
            },
        };

        debug!(from = ?state.phase, to = ?next, "Bridge phase change");
        state.phase = next;
        SmallVec::new()
    }
}
