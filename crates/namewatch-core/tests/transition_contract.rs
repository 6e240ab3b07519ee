//! Architectural Contract Test: Transition Detection
//!
//! This test verifies that only status edges produce notifications.
//!
//! Constraints verified:
//! - Repeated identical verdicts emit at most one event per edge
//! - Claimed → Available → Claimed yields exactly one event per edge
//! - Dwell time equals the elapsed time between the two transition points
//! - Identifiers are visited in stable order
//!
//! If this test fails, users get duplicate or missing notifications.

mod common;

use common::*;
use namewatch_core::{
    EngineEvent, IdentifierStore, MemoryAvailabilityLog, PollEngine, Status, TransitionEvent,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn engine_with(
    names: &[&str],
    probe: &ScriptedProbe,
    notifier: &RecordingNotifier,
    log: &MemoryAvailabilityLog,
) -> (PollEngine, tokio::sync::mpsc::Receiver<EngineEvent>) {
    PollEngine::new(
        Arc::new(IdentifierStore::new(names.iter().copied())),
        Box::new(ScriptedProbe::sharing_counters_with(probe)),
        Box::new(RecordingNotifier::sharing_counters_with(notifier)),
        Box::new(log.clone()),
        &minimal_config(),
    )
    .expect("engine construction succeeds")
}

#[tokio::test(start_paused = true)]
async fn repeated_available_verdict_notifies_once() {
    let probe = ScriptedProbe::new();
    probe.script("foo", vec![valid()]);
    let notifier = RecordingNotifier::new();
    let log = MemoryAvailabilityLog::new();
    let (engine, _rx) = engine_with(&["foo"], &probe, &notifier, &log);
    let shutdown = CancellationToken::new();

    for _ in 0..5 {
        engine.run_cycle(&shutdown).await.unwrap();
    }

    assert_eq!(probe.calls_for("foo"), 5);
    assert_eq!(
        notifier.call_count(),
        1,
        "Expected 1 notification for 5 identical verdicts"
    );
    assert_eq!(log.names().await, vec!["foo".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn repeated_claimed_verdict_never_notifies() {
    let probe = ScriptedProbe::new();
    probe.script("foo", vec![taken()]);
    let notifier = RecordingNotifier::new();
    let log = MemoryAvailabilityLog::new();
    let (engine, _rx) = engine_with(&["foo"], &probe, &notifier, &log);
    let shutdown = CancellationToken::new();

    for _ in 0..3 {
        engine.run_cycle(&shutdown).await.unwrap();
    }

    assert_eq!(notifier.call_count(), 0);
    assert!(log.is_empty().await);

    // Claimed from Unknown is not an edge
    let state = engine.store().get("foo").await.unwrap();
    assert_eq!(state.status(), Status::Unknown);
}

#[tokio::test(start_paused = true)]
async fn claimed_available_claimed_yields_one_event_per_edge() {
    let probe = ScriptedProbe::new();
    probe.script("foo", vec![taken(), valid(), valid(), taken(), taken()]);
    let notifier = RecordingNotifier::new();
    let log = MemoryAvailabilityLog::new();
    let (engine, rx) = engine_with(&["foo"], &probe, &notifier, &log);
    let shutdown = CancellationToken::new();

    engine.run_cycle(&shutdown).await.unwrap();
    engine.run_cycle(&shutdown).await.unwrap();
    tokio::time::advance(Duration::from_millis(1500)).await;
    engine.run_cycle(&shutdown).await.unwrap();
    tokio::time::advance(Duration::from_millis(2500)).await;
    engine.run_cycle(&shutdown).await.unwrap();
    engine.run_cycle(&shutdown).await.unwrap();

    let events = notifier.events();
    assert_eq!(events.len(), 2, "Expected exactly two edges, got {:?}", events);
    assert!(matches!(&events[0], TransitionEvent::Available { name, .. } if name == "foo"));
    match &events[1] {
        TransitionEvent::Claimed { name, dwell, .. } => {
            assert_eq!(name, "foo");
            assert_eq!(*dwell, Duration::from_millis(4000));
        }
        other => panic!("Expected a claimed event, got {:?}", other),
    }

    let emitted = transitions(&drain_events(rx).await);
    assert_eq!(emitted, events, "engine events mirror dispatched events");
}

#[tokio::test(start_paused = true)]
async fn foo_bar_scenario() {
    let probe = ScriptedProbe::new();
    probe.script(
        "foo",
        vec![
            Ok(namewatch_core::ProbeResponse::answered("Username is valid", 0)),
            Ok(namewatch_core::ProbeResponse::answered(
                "Username has invalid characters",
                2,
            )),
        ],
    );
    probe.script("bar", vec![taken()]);
    let notifier = RecordingNotifier::new();
    let log = MemoryAvailabilityLog::new();
    let (engine, _rx) = engine_with(&["foo", "bar"], &probe, &notifier, &log);
    let shutdown = CancellationToken::new();

    // Cycle 1
    engine.run_cycle(&shutdown).await.unwrap();

    assert_eq!(
        engine.store().get("foo").await.unwrap().status(),
        Status::Available
    );
    assert_eq!(notifier.call_count(), 1);
    assert_eq!(log.names().await, vec!["foo".to_string()]);

    // Cycle 2, 5 seconds later
    tokio::time::advance(Duration::from_secs(5)).await;
    engine.run_cycle(&shutdown).await.unwrap();

    let foo = engine.store().get("foo").await.unwrap();
    assert_eq!(foo.status(), Status::Claimed);
    assert!(foo.available_since().is_none());

    let events = notifier.events();
    assert_eq!(events.len(), 2);
    match &events[1] {
        TransitionEvent::Claimed { name, dwell, .. } => {
            assert_eq!(name, "foo");
            assert!((dwell.as_secs_f64() - 5.0).abs() < 1e-3);
        }
        other => panic!("Expected a claimed event, got {:?}", other),
    }
    assert_eq!(log.len().await, 1, "claims are not logged");

    assert_eq!(probe.calls(), ["foo", "bar", "foo", "bar"]);
}

#[tokio::test(start_paused = true)]
async fn cycle_completed_event_reports_every_identifier() {
    let probe = ScriptedProbe::new();
    probe.script("foo", vec![taken()]);
    probe.script("bar", vec![taken()]);
    let notifier = RecordingNotifier::new();
    let log = MemoryAvailabilityLog::new();
    let (engine, rx) = engine_with(&["foo", "bar", "foo"], &probe, &notifier, &log);

    engine.run_cycle(&CancellationToken::new()).await.unwrap();

    let events = drain_events(rx).await;
    assert!(events.contains(&EngineEvent::CycleCompleted {
        cycle: 1,
        identifiers_count: 2,
    }));
    assert_eq!(probe.call_count(), 2, "duplicates are tracked once");
}
