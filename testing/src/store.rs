//! In-memory event stores for testing.
//!
//! [`InMemoryEventStore`] implements the real conditional-commit contract
//! under a single lock, so engine tests exercise genuine optimistic races
//! without a database. [`ConflictingEventStore`] and [`FailingEventStore`]
//! inject the contention and outage paths deterministically.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use guestlist_core::event::{EventId, EventSnapshot};
use guestlist_core::registration::Registration;
use guestlist_core::store::{CommitError, CommitReceipt, EventStore, ExpectedState, StoreError};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// One event's stored state: the snapshot plus its registration log.
#[derive(Debug, Clone)]
struct EventRecord {
    snapshot: EventSnapshot,
    registrations: Vec<Registration>,
}

/// In-memory [`EventStore`] with real conditional-commit semantics.
///
/// Commits take a write lock and perform the full atomic check inside it:
/// duplicate key, then version and count precondition, then capacity. The
/// ordering mirrors the Postgres store, which inserts the registration row
/// (surfacing duplicates) before running the guarded counter update.
///
/// Cloning is cheap and shares state, so a test can hand the store to an
/// engine and keep a handle for assertions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    records: Arc<RwLock<HashMap<EventId, EventRecord>>>,
}

impl InMemoryEventStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an event snapshot.
    pub fn insert(&self, snapshot: EventSnapshot) {
        let mut records = self.records.write().unwrap();
        records.insert(
            snapshot.id,
            EventRecord {
                snapshot,
                registrations: Vec::new(),
            },
        );
    }

    /// Current snapshot of one event, if present.
    #[must_use]
    pub fn snapshot(&self, event_id: &EventId) -> Option<EventSnapshot> {
        let records = self.records.read().unwrap();
        records.get(event_id).map(|record| record.snapshot.clone())
    }

    /// Every registration committed against one event, in commit order.
    #[must_use]
    pub fn registrations(&self, event_id: &EventId) -> Vec<Registration> {
        let records = self.records.read().unwrap();
        records
            .get(event_id)
            .map(|record| record.registrations.clone())
            .unwrap_or_default()
    }

    /// Number of events held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Whether the store holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }

    /// Remove every event.
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
    }
}

impl EventStore for InMemoryEventStore {
    fn load_event(
        &self,
        event_id: &EventId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<EventSnapshot>, StoreError>> + Send + '_>> {
        let event_id = *event_id;
        Box::pin(async move {
            let records = self.records.read().unwrap();
            Ok(records.get(&event_id).map(|record| record.snapshot.clone()))
        })
    }

    fn commit_registration(
        &self,
        event_id: &EventId,
        expected: ExpectedState,
        registration: Registration,
    ) -> Pin<Box<dyn Future<Output = Result<CommitReceipt, CommitError>> + Send + '_>> {
        let event_id = *event_id;
        Box::pin(async move {
            let mut records = self.records.write().unwrap();
            let record = records
                .get_mut(&event_id)
                .ok_or(CommitError::EventMissing(event_id))?;

            if record
                .snapshot
                .registrants
                .contains(&registration.registrant_key)
            {
                return Err(CommitError::DuplicateRegistrant {
                    event_id,
                    registrant_key: registration.registrant_key,
                });
            }

            let stale = record.snapshot.version != expected.version
                || record.snapshot.registered_count != expected.registered_count;
            // A party that no longer fits is reported as a lost race even when
            // the version matches: the caller re-reads and its admission rules
            // produce the real capacity rejection.
            if stale || !record.snapshot.can_accommodate(registration.party_size.value()) {
                return Err(CommitError::PreconditionFailed {
                    event_id,
                    expected: expected.version,
                    actual: record.snapshot.version,
                });
            }

            record.snapshot.registered_count += registration.party_size.value();
            record.snapshot.version = record.snapshot.version.next();
            record
                .snapshot
                .registrants
                .insert(registration.registrant_key.clone());
            record.registrations.push(registration);

            Ok(CommitReceipt {
                version: record.snapshot.version,
                registered_count: record.snapshot.registered_count,
            })
        })
    }
}

/// Store whose commits always lose the optimistic race.
///
/// Loads serve the snapshot it was built with; every commit reports a
/// version moved one past the expectation. Used to drive the engine into
/// retry exhaustion.
#[derive(Debug)]
pub struct ConflictingEventStore {
    snapshot: EventSnapshot,
    commit_attempts: AtomicUsize,
}

impl ConflictingEventStore {
    /// Create a store that serves `snapshot` and rejects every commit.
    #[must_use]
    pub const fn new(snapshot: EventSnapshot) -> Self {
        Self {
            snapshot,
            commit_attempts: AtomicUsize::new(0),
        }
    }

    /// How many commits were attempted (and rejected).
    #[must_use]
    pub fn commit_attempts(&self) -> usize {
        self.commit_attempts.load(Ordering::SeqCst)
    }
}

impl EventStore for ConflictingEventStore {
    fn load_event(
        &self,
        event_id: &EventId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<EventSnapshot>, StoreError>> + Send + '_>> {
        let found = (self.snapshot.id == *event_id).then(|| self.snapshot.clone());
        Box::pin(async move { Ok(found) })
    }

    fn commit_registration(
        &self,
        event_id: &EventId,
        expected: ExpectedState,
        _registration: Registration,
    ) -> Pin<Box<dyn Future<Output = Result<CommitReceipt, CommitError>> + Send + '_>> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        let event_id = *event_id;
        Box::pin(async move {
            Err(CommitError::PreconditionFailed {
                event_id,
                expected: expected.version,
                actual: expected.version.next(),
            })
        })
    }
}

/// Store that fails with infrastructure errors.
///
/// Built via [`FailingEventStore::failing_loads`] (every load errors) or
/// [`FailingEventStore::failing_commits`] (loads serve a snapshot, every
/// commit errors). Call counters let tests assert the engine gave up
/// immediately instead of retrying.
#[derive(Debug, Default)]
pub struct FailingEventStore {
    snapshot: Option<EventSnapshot>,
    load_calls: AtomicUsize,
    commit_calls: AtomicUsize,
}

impl FailingEventStore {
    /// Create a store whose loads always fail with a connection error.
    #[must_use]
    pub fn failing_loads() -> Self {
        Self::default()
    }

    /// Create a store whose loads serve `snapshot` but whose commits always
    /// fail with a database error.
    #[must_use]
    pub fn failing_commits(snapshot: EventSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..Self::default()
        }
    }

    /// How many loads were attempted.
    #[must_use]
    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// How many commits were attempted.
    #[must_use]
    pub fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }
}

impl EventStore for FailingEventStore {
    fn load_event(
        &self,
        event_id: &EventId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<EventSnapshot>, StoreError>> + Send + '_>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let found = self
            .snapshot
            .as_ref()
            .filter(|snapshot| snapshot.id == *event_id)
            .cloned();
        let serve = self.snapshot.is_some();
        Box::pin(async move {
            if serve {
                Ok(found)
            } else {
                Err(StoreError::Connection("connection refused".to_string()))
            }
        })
    }

    fn commit_registration(
        &self,
        _event_id: &EventId,
        _expected: ExpectedState,
        _registration: Registration,
    ) -> Pin<Box<dyn Future<Output = Result<CommitReceipt, CommitError>> + Send + '_>> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {
            Err(CommitError::Store(StoreError::Database(
                "connection lost mid-statement".to_string(),
            )))
        })
    }
}
