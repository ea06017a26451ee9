//! Integration tests for the session state coordinator
//!
//! Replies are scripted per frame timestamp, so the order in which in-flight
//! calls complete is controlled by the test.

mod common;

use common::*;
use fixfit::*;
use std::sync::Arc;

fn coordinator_with(service: &Arc<ScriptedService>) -> SessionCoordinator {
    SessionCoordinator::new(service.clone())
}

// ============================================================================
// FRAME OUTCOME TESTS
// ============================================================================

#[tokio::test]
async fn test_result_replaces_state() {
    let service = ScriptedService::new();
    let expected = valgus_result(1_700_000_000_000.0);
    service.reply_with(Ok(expected.clone()));
    let coordinator = coordinator_with(&service);

    coordinator.start();
    let outcome = coordinator
        .on_frame_captured(encoded_frame(1_700_000_000_000))
        .await;

    assert_eq!(outcome, FrameOutcome::ResultApplied { seq: 1 });
    let state = coordinator.snapshot();
    assert_eq!(state.latest_result, Some(expected));
    assert_eq!(state.latest_error, None);
    assert!(state.is_active);
}

#[tokio::test]
async fn test_rejection_keeps_previous_result() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);
    coordinator.start();

    service.reply_with(Ok(result_with_reps(2)));
    coordinator.on_frame_captured(encoded_frame(1)).await;

    service.reply_with(Err(rejected("model unavailable")));
    let outcome = coordinator.on_frame_captured(encoded_frame(2)).await;

    assert_eq!(outcome, FrameOutcome::ErrorRecorded { seq: 2 });
    let state = coordinator.snapshot();
    assert_eq!(state.latest_error.as_deref(), Some("model unavailable"));
    assert_eq!(state.latest_result, Some(result_with_reps(2)));
}

#[tokio::test]
async fn test_success_clears_error() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);
    coordinator.start();

    service.reply_with(Err(AnalysisError::TransportFailure {
        reason: "connection refused".to_string(),
    }));
    coordinator.on_frame_captured(encoded_frame(1)).await;
    assert_eq!(
        coordinator.snapshot().latest_error.as_deref(),
        Some("Transport failure: connection refused")
    );

    service.reply_with(Ok(result_with_reps(1)));
    coordinator.on_frame_captured(encoded_frame(2)).await;
    assert_eq!(coordinator.snapshot().latest_error, None);
}

#[tokio::test]
async fn test_inactive_frames_not_sent() {
    let service = ScriptedService::new();
    service.reply_with(Ok(result_with_reps(1)));
    let coordinator = coordinator_with(&service);

    let outcome = coordinator.on_frame_captured(encoded_frame(1)).await;

    assert_eq!(outcome, FrameOutcome::NotDispatched);
    assert_eq!(service.calls(), 0);
    assert_eq!(coordinator.snapshot(), SessionState::new());
}

#[tokio::test]
async fn test_frame_payload_and_timestamp_forwarded() {
    let service = ScriptedService::new();
    service.reply_with(Ok(result_with_reps(1)));
    let coordinator = coordinator_with(&service);
    coordinator.start();

    let frame = encoded_frame(1_700_000_000_456);
    coordinator.on_frame_captured(frame.clone()).await;

    let frames = service.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, frame.data_uri());
    assert_eq!(frames[0].1, 1_700_000_000_456);
}

// ============================================================================
// STOP GUARD TESTS
// ============================================================================

#[tokio::test]
async fn test_response_after_stop_is_discarded() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);
    coordinator.start();

    let reply = service.hold(10);
    let in_flight = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.on_frame_captured(encoded_frame(10)).await }
    });
    service.wait_for_calls(1).await;

    coordinator.stop();
    reply.send(Ok(result_with_reps(5))).unwrap();

    assert_eq!(
        in_flight.await.unwrap(),
        FrameOutcome::Discarded {
            seq: 1,
            reason: DiscardReason::Inactive
        }
    );
    let state = coordinator.snapshot();
    assert!(!state.is_active);
    assert_eq!(state.latest_result, None);
    assert_eq!(state.latest_error, None);
}

#[tokio::test]
async fn test_error_after_stop_is_discarded() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);
    coordinator.start();

    let reply = service.hold(10);
    let in_flight = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.on_frame_captured(encoded_frame(10)).await }
    });
    service.wait_for_calls(1).await;

    coordinator.stop();
    reply.send(Err(rejected("too late"))).unwrap();

    assert!(matches!(
        in_flight.await.unwrap(),
        FrameOutcome::Discarded { .. }
    ));
    assert_eq!(coordinator.snapshot().latest_error, None);
}

#[tokio::test]
async fn test_response_from_previous_epoch_is_discarded() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);
    assert_eq!(coordinator.start(), 1);

    let reply = service.hold(10);
    let in_flight = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.on_frame_captured(encoded_frame(10)).await }
    });
    service.wait_for_calls(1).await;

    coordinator.stop();
    assert_eq!(coordinator.start(), 2);
    reply.send(Ok(result_with_reps(5))).unwrap();

    assert_eq!(
        in_flight.await.unwrap(),
        FrameOutcome::Discarded {
            seq: 1,
            reason: DiscardReason::StaleEpoch
        }
    );
    assert!(coordinator.is_active());
    assert_eq!(coordinator.snapshot().latest_result, None);
}

// ============================================================================
// OUT-OF-ORDER RESPONSE TESTS
// ============================================================================

#[tokio::test]
async fn test_newest_dispatch_wins() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);
    coordinator.start();

    let first_reply = service.hold(1);
    let second_reply = service.hold(2);

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.on_frame_captured(encoded_frame(1)).await }
    });
    service.wait_for_calls(1).await;
    let second = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.on_frame_captured(encoded_frame(2)).await }
    });
    service.wait_for_calls(2).await;

    second_reply.send(Ok(result_with_reps(2))).unwrap();
    assert_eq!(
        second.await.unwrap(),
        FrameOutcome::ResultApplied { seq: 2 }
    );

    first_reply.send(Ok(result_with_reps(1))).unwrap();
    assert_eq!(
        first.await.unwrap(),
        FrameOutcome::Discarded {
            seq: 1,
            reason: DiscardReason::Superseded
        }
    );

    assert_eq!(coordinator.snapshot().latest_result, Some(result_with_reps(2)));
}

#[tokio::test]
async fn test_late_error_does_not_override_newer_result() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);
    coordinator.start();

    let first_reply = service.hold(1);
    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.on_frame_captured(encoded_frame(1)).await }
    });
    service.wait_for_calls(1).await;

    service.reply_with(Ok(result_with_reps(4)));
    coordinator.on_frame_captured(encoded_frame(2)).await;

    first_reply.send(Err(rejected("stale failure"))).unwrap();
    assert!(matches!(
        first.await.unwrap(),
        FrameOutcome::Discarded {
            reason: DiscardReason::Superseded,
            ..
        }
    ));

    let state = coordinator.snapshot();
    assert_eq!(state.latest_error, None);
    assert_eq!(state.latest_result, Some(result_with_reps(4)));
}

// ============================================================================
// TRANSITION TESTS
// ============================================================================

#[tokio::test]
async fn test_restart_clears_error_keeps_result() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);
    coordinator.start();

    service.reply_with(Ok(result_with_reps(3)));
    coordinator.on_frame_captured(encoded_frame(1)).await;
    service.reply_with(Err(rejected("model unavailable")));
    coordinator.on_frame_captured(encoded_frame(2)).await;

    coordinator.stop();
    let stopped = coordinator.snapshot();
    assert!(!stopped.is_active);
    assert_eq!(stopped.latest_result, Some(result_with_reps(3)));

    coordinator.start();
    let state = coordinator.snapshot();
    assert!(state.is_active);
    assert_eq!(state.latest_error, None);
    assert_eq!(state.latest_result, Some(result_with_reps(3)));
}

#[tokio::test]
async fn test_reset_clears_and_keeps_activity() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);

    for active in [true, false] {
        if active {
            coordinator.start();
        } else {
            coordinator.stop();
        }
        coordinator.record_error("camera offline");

        coordinator.reset();
        let state = coordinator.snapshot();
        assert_eq!(state.is_active, active);
        assert_eq!(state.latest_result, None);
        assert_eq!(state.latest_error, None);
    }

    coordinator.start();
    service.reply_with(Ok(result_with_reps(7)));
    coordinator.on_frame_captured(encoded_frame(1)).await;
    coordinator.reset();
    coordinator.reset();
    assert_eq!(coordinator.snapshot().latest_result, None);
    assert!(coordinator.is_active());
}

#[tokio::test]
async fn test_stop_when_inactive_is_silent() {
    let service = ScriptedService::new();
    let coordinator = coordinator_with(&service);
    let mut events = coordinator.subscribe();

    coordinator.stop();
    assert_eq!(events.try_next(), None);
    assert_eq!(coordinator.epoch(), 0);
}

// ============================================================================
// EVENT AND PROFILING TESTS
// ============================================================================

#[tokio::test]
async fn test_event_sequence() {
    let service = ScriptedService::new();
    service.reply_with(Ok(result_with_reps(1)));
    let coordinator = coordinator_with(&service);
    let mut events = coordinator.subscribe();

    coordinator.start();
    coordinator.on_frame_captured(encoded_frame(1)).await;
    coordinator.stop();
    coordinator.reset();

    assert_eq!(events.next().await, Some(SessionEvent::Started { epoch: 1 }));
    assert_eq!(
        events.next().await,
        Some(SessionEvent::ResultApplied {
            seq: 1,
            result: Box::new(result_with_reps(1))
        })
    );
    assert_eq!(events.next().await, Some(SessionEvent::Stopped));
    assert_eq!(events.next().await, Some(SessionEvent::Reset));
    assert_eq!(events.try_next(), None);
}

#[tokio::test]
async fn test_round_trips_are_profiled() {
    let service = ScriptedService::new();
    service.reply_with(Ok(valgus_result(1.0)));
    let coordinator = coordinator_with(&service);
    coordinator.start();

    coordinator.on_frame_captured(encoded_frame(1)).await;
    coordinator.on_frame_captured(encoded_frame(2)).await;

    let report = coordinator.profiler().report();
    assert_eq!(report.samples, 2);
    assert_eq!(report.mean_server_ms, Some(12.5));
    assert!(report.last_ms.is_some());
}
