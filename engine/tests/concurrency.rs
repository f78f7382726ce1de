//! Concurrency and failure-path integration tests.
//!
//! Verifies the no-overbooking guarantee under real task interleavings,
//! single-winner semantics for duplicate keys, retry exhaustion, and the
//! never-retried infrastructure failure channel.
//!
//! Run with: `cargo test --test concurrency`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use guestlist_core::error::RegistrationError;
use guestlist_core::notify::{NoopDispatcher, NotificationDispatcher};
use guestlist_core::registration::{PartySize, RegistrantKey};
use guestlist_core::store::Version;
use guestlist_engine::{EngineConfig, RegistrationEngine};
use guestlist_testing::{
    ConflictingEventStore, EventSnapshotBuilder, FailingEventStore, InMemoryEventStore, test_clock,
};
use std::sync::Arc;

fn noop_dispatcher() -> Arc<dyn NotificationDispatcher> {
    Arc::new(NoopDispatcher)
}

/// Test 1: No Overbooking Under Contention
///
/// Twenty concurrent single-seat registrations compete for five seats.
/// Exactly five commit; the rest are refused on capacity. A task retries
/// only when another commit landed between its read and its write, so a
/// budget above the seat count makes the outcome deterministic.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_no_overbooking_under_contention() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();

    let store = Arc::new(InMemoryEventStore::new());
    let event = EventSnapshotBuilder::new().capacity(5).build();
    let event_id = event.id;
    store.insert(event);

    let engine = RegistrationEngine::with_config(
        store.clone(),
        Arc::new(test_clock()),
        noop_dispatcher(),
        EngineConfig::new(8),
    );

    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = engine.clone();
        let key = format!("guest-{i}");
        handles.push(tokio::spawn(async move {
            engine
                .register(&event_id, RegistrantKey::new(key), PartySize::new(1), "")
                .await
        }));
    }

    let mut admitted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => admitted += 1,
            Err(error) => {
                assert!(
                    matches!(error, RegistrationError::CapacityExceeded { .. }),
                    "unexpected outcome: {error}"
                );
                refused += 1;
            }
        }
    }

    assert_eq!(admitted, 5);
    assert_eq!(refused, 15);

    let snapshot = store.snapshot(&event_id).unwrap();
    assert_eq!(snapshot.registered_count, 5);
    assert_eq!(snapshot.version, Version::new(5));
    assert_eq!(store.registrations(&event_id).len(), 5);
}

/// Test 2: One Winner Per Key
///
/// Ten concurrent registrations with the same key produce exactly one
/// committed registration; every loser is answered idempotently whether it
/// lost at the fail-fast check or inside the atomic commit.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_duplicates_have_one_winner() {
    let store = Arc::new(InMemoryEventStore::new());
    let event = EventSnapshotBuilder::new().capacity(100).build();
    let event_id = event.id;
    store.insert(event);

    let engine =
        RegistrationEngine::new(store.clone(), Arc::new(test_clock()), noop_dispatcher());

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .register(&event_id, RegistrantKey::new("mallory"), PartySize::new(2), "")
                .await
        }));
    }

    let mut admitted = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => admitted += 1,
            Err(error) => {
                assert!(
                    matches!(error, RegistrationError::AlreadyRegistered { .. }),
                    "unexpected outcome: {error}"
                );
                duplicates += 1;
            }
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(duplicates, 9);

    let snapshot = store.snapshot(&event_id).unwrap();
    assert_eq!(snapshot.registered_count, 2);
    assert_eq!(store.registrations(&event_id).len(), 1);
}

/// Test 3: Retry Exhaustion
///
/// A store that always reports a lost race drives the engine through its
/// full attempt budget, then surfaces the transient conflict error.
#[tokio::test]
async fn test_retry_exhaustion_reports_conflict() {
    let event = EventSnapshotBuilder::new().capacity(5).build();
    let event_id = event.id;
    let store = Arc::new(ConflictingEventStore::new(event));

    let engine =
        RegistrationEngine::new(store.clone(), Arc::new(test_clock()), noop_dispatcher());

    let error = engine
        .register(&event_id, RegistrantKey::new("alice"), PartySize::new(1), "")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        RegistrationError::Conflict { attempts: 4, .. }
    ));
    assert!(error.is_transient());
    assert_eq!(store.commit_attempts(), 4);
}

/// Test 4: Attempt Budget Is Configurable
///
/// A custom cap changes both the number of attempts made and the number
/// reported in the conflict error.
#[tokio::test]
async fn test_conflict_attempts_follow_config() {
    let event = EventSnapshotBuilder::new().capacity(5).build();
    let event_id = event.id;
    let store = Arc::new(ConflictingEventStore::new(event));

    let engine = RegistrationEngine::with_config(
        store.clone(),
        Arc::new(test_clock()),
        noop_dispatcher(),
        EngineConfig::new(2),
    );

    let error = engine
        .register(&event_id, RegistrantKey::new("alice"), PartySize::new(1), "")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        RegistrationError::Conflict { attempts: 2, .. }
    ));
    assert_eq!(store.commit_attempts(), 2);
}

/// Test 5: Store Failure Is Never Retried
///
/// Infrastructure failures surface immediately on their own channel, with
/// exactly one load or commit attempted, and are never reported as
/// contention.
#[tokio::test]
async fn test_store_failure_is_not_retried() {
    // Failing loads: one call, immediate error.
    let store = Arc::new(FailingEventStore::failing_loads());
    let engine =
        RegistrationEngine::new(store.clone(), Arc::new(test_clock()), noop_dispatcher());

    let event = EventSnapshotBuilder::new().build();
    let error = engine
        .register(&event.id, RegistrantKey::new("alice"), PartySize::new(1), "")
        .await
        .unwrap_err();
    assert!(matches!(error, RegistrationError::StoreUnavailable(_)));
    assert!(!error.is_transient());
    assert_eq!(store.load_calls(), 1);
    assert_eq!(store.commit_calls(), 0);

    // Failing commits: one load, one commit, immediate error.
    let event = EventSnapshotBuilder::new().capacity(5).build();
    let event_id = event.id;
    let store = Arc::new(FailingEventStore::failing_commits(event));
    let engine =
        RegistrationEngine::new(store.clone(), Arc::new(test_clock()), noop_dispatcher());

    let error = engine
        .register(&event_id, RegistrantKey::new("bob"), PartySize::new(1), "")
        .await
        .unwrap_err();
    assert!(matches!(error, RegistrationError::StoreUnavailable(_)));
    assert_eq!(store.load_calls(), 1);
    assert_eq!(store.commit_calls(), 1);
}
