//! Stream-level properties of the bridge reducer and frame decoder.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use ashva_realtime_core::bridge::{
    BridgeAction, BridgeEnvironment, BridgePhase, BridgeReducer, BridgeState, CloseReason,
};
use ashva_realtime_core::key::{QueryKey, well_known};
use ashva_realtime_core::sse::Frame;
use ashva_realtime_testing::helpers::replay_stream;
use ashva_realtime_testing::{RecordingCache, ReducerTest, assertions, fixtures, properties};
use proptest::prelude::*;

// ============================================================================
// Fixtures
// ============================================================================

const UNCONDITIONAL: [&[&str]; 3] = [
    well_known::ADMIN_DASHBOARD,
    well_known::SUBSCRIPTION,
    well_known::PAYMENTS,
];

fn streaming() -> BridgeState {
    BridgeState {
        phase: BridgePhase::Streaming,
        ..BridgeState::default()
    }
}

fn frame(payload: &str) -> BridgeAction {
    BridgeAction::FrameReceived(Frame::new(format!("data: {payload}")))
}

/// A realistic session: hello, keep-alives, events, a malformed frame and
/// a multi-byte payload.
fn session_body() -> String {
    [
        fixtures::ready_frame(),
        fixtures::comment("keep-alive"),
        fixtures::data_frame(r#"{"type":"tickets.changed","service":"tickets","data":{"note":"फ़िल्टर बदला ✓"}}"#),
        fixtures::data_frame("{\"service\":"),
        fixtures::data_frame("{\"type\":\n\"assignments.created\"}"),
        fixtures::comment("keep-alive"),
        fixtures::data_frame(r#"{"service":"billing","data":"₹499"}"#),
        "data: {\"service\":\"tickets\"}".to_string(),
    ]
    .concat()
}

// ============================================================================
// Dispatch policy
// ============================================================================

#[test]
fn test_ticket_service_event() {
    ReducerTest::new(BridgeReducer)
        .with_env(BridgeEnvironment::default())
        .given_state(streaming())
        .when_action(frame(r#"{"service":"tickets"}"#))
        .then_effects(|effects| {
            let mut expected = vec![well_known::ADMIN_TICKETS, well_known::TICKETS];
            expected.extend(UNCONDITIONAL);
            assertions::assert_invalidates_in_order(effects, expected);
        })
        .run();
}

#[test]
fn test_assignment_type_event() {
    ReducerTest::new(BridgeReducer)
        .with_env(BridgeEnvironment::default())
        .given_state(streaming())
        .when_action(frame(r#"{"type":"assignments.created"}"#))
        .then_effects(|effects| {
            let mut expected = vec![well_known::TECH_ASSIGNMENTS, well_known::ADMIN_TICKETS];
            expected.extend(UNCONDITIONAL);
            assertions::assert_invalidates_in_order(effects, expected);
        })
        .run();
}

#[test]
fn test_unrecognised_service_event() {
    ReducerTest::new(BridgeReducer)
        .with_env(BridgeEnvironment::default())
        .given_state(streaming())
        .when_action(frame(r#"{"service":"billing"}"#))
        .then_effects(|effects| assertions::assert_invalidates(effects, UNCONDITIONAL))
        .run();
}

#[test]
fn test_heartbeat_and_blank_frames() {
    ReducerTest::new(BridgeReducer)
        .given_state(streaming())
        .when_action(frame("{}"))
        .when_action(BridgeAction::FrameReceived(Frame::new("   \n  ")))
        .when_action(BridgeAction::FrameReceived(Frame::new("event: ping")))
        .then_effects(assertions::assert_no_effects)
        .then_state(|state| {
            assert_eq!(state.stats.heartbeats, 1);
            assert_eq!(state.stats.skipped, 2);
        })
        .run();
}

#[test]
fn test_cancellation_stops_dispatch() {
    ReducerTest::new(BridgeReducer)
        .given_state(streaming())
        .when_action(BridgeAction::Cancelled)
        .when_action(frame(r#"{"service":"tickets"}"#))
        .then_effects(assertions::assert_no_effects)
        .then_state(|state| {
            assert_eq!(state.phase, BridgePhase::Closed(CloseReason::Cancelled));
        })
        .run();
}

// ============================================================================
// Stream replay
// ============================================================================

#[test]
fn test_session_replay() {
    let body = session_body();
    let cache = RecordingCache::new();

    let state = replay_stream(&[body.as_bytes()], &cache);

    assert_eq!(state.stats.frames, 7);
    assert_eq!(state.stats.heartbeats, 1);
    assert_eq!(state.stats.skipped, 2);
    assert_eq!(state.stats.malformed, 1);
    assert_eq!(state.stats.events, 3);
    // tickets (5) + assignments (5) + billing (3); the trailing frame is unterminated
    assert_eq!(cache.call_count(), 13);
    assert_eq!(cache.calls()[0], QueryKey::from(well_known::ADMIN_TICKETS));
}

proptest! {
    #[test]
    fn prop_chunk_splits_do_not_change_dispatch(
        chunks in properties::chunked(session_body().into_bytes())
    ) {
        let whole = RecordingCache::new();
        let whole_state = replay_stream(&[session_body().as_bytes()], &whole);

        let split = RecordingCache::new();
        let chunk_refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
        let split_state = replay_stream(&chunk_refs, &split);

        prop_assert_eq!(whole.calls(), split.calls());
        prop_assert_eq!(whole_state, split_state);
    }
}
