//! The registration engine: orchestration around the capacity gate.
//!
//! [`RegistrationEngine`] owns the load, validate, gate, commit loop. The
//! gate stays pure; everything effectful lives here: reading the store,
//! sampling the clock, retrying lost optimistic races from a fresh read,
//! and spawning the confirmation notice once a commit lands.

use crate::config::EngineConfig;
use guestlist_core::environment::Clock;
use guestlist_core::error::RegistrationError;
use guestlist_core::event::{Availability, EventId};
use guestlist_core::gate::{Decision, RejectReason, decide};
use guestlist_core::idempotency::already_registered;
use guestlist_core::notify::{Notice, NotificationDispatcher};
use guestlist_core::registration::{PartySize, RegistrantKey, Registration};
use guestlist_core::store::{CommitError, EventStore};
use std::sync::Arc;

/// The registration engine.
///
/// Collaborators are held as trait objects so production (Postgres store,
/// system clock) and tests (in-memory store, fixed clock, recording
/// dispatcher) assemble the same engine.
///
/// # Concurrency
///
/// [`RegistrationEngine::register`] holds no locks across awaits and never
/// serializes callers; the no-overbooking guarantee comes entirely from the
/// store's conditional commit. Cloning is cheap and shares the
/// collaborators.
#[derive(Clone)]
pub struct RegistrationEngine {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    config: EngineConfig,
}

impl RegistrationEngine {
    /// Create an engine with the default configuration.
    #[must_use]
    pub fn new(
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self::with_config(store, clock, dispatcher, EngineConfig::default())
    }

    /// Create an engine with a custom configuration.
    #[must_use]
    pub fn with_config(
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            dispatcher,
            config,
        }
    }

    /// Register a party for an event.
    ///
    /// One pass per attempt: load a fresh snapshot, validate the party
    /// size, fail fast on a known duplicate, run the admission rules, then
    /// commit conditioned on exactly the state the decision was made
    /// against. Only a lost optimistic race loops back for another attempt;
    /// every other outcome returns immediately. The registration timestamp
    /// and the admission instant are the same clock sample.
    ///
    /// On success the confirmation notice is dispatched on a spawned task;
    /// a dispatch failure is logged and never changes the result.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EventNotFound`]: no event with this id
    /// - [`RegistrationError::InvalidPartySize`]: party size below 1
    /// - [`RegistrationError::AlreadyRegistered`]: key already registered
    /// - [`RegistrationError::EventNotOpen`]: stored status not `Active`
    /// - [`RegistrationError::DeadlinePassed`]: now strictly after the deadline
    /// - [`RegistrationError::CapacityExceeded`]: party does not fit
    /// - [`RegistrationError::Conflict`]: every commit attempt lost its race
    /// - [`RegistrationError::StoreUnavailable`]: infrastructure failure
    pub async fn register(
        &self,
        event_id: &EventId,
        registrant_key: RegistrantKey,
        party_size: PartySize,
        notes: impl Into<String> + Send,
    ) -> Result<Registration, RegistrationError> {
        let notes = notes.into();
        // A cap of zero would mean no attempt at all; always make one.
        let max_attempts = self.config.max_commit_attempts.max(1);

        for attempt in 1..=max_attempts {
            let snapshot = self
                .store
                .load_event(event_id)
                .await?
                .ok_or(RegistrationError::EventNotFound(*event_id))?;

            if !party_size.is_valid() {
                return Err(RegistrationError::InvalidPartySize {
                    requested: party_size.value(),
                });
            }

            if already_registered(&snapshot, &registrant_key) {
                return Err(RegistrationError::AlreadyRegistered {
                    event_id: *event_id,
                    registrant_key,
                });
            }

            let now = self.clock.now();
            if let Decision::Reject(reason) = decide(&snapshot, party_size, now) {
                return Err(rejection(*event_id, reason));
            }

            let registration =
                Registration::new(registrant_key.clone(), party_size, notes.clone(), now);

            match self
                .store
                .commit_registration(event_id, snapshot.expected_state(), registration.clone())
                .await
            {
                Ok(receipt) => {
                    tracing::info!(
                        event_id = %event_id,
                        registrant_key = %registration.registrant_key,
                        party_size = party_size.value(),
                        registered_count = receipt.registered_count,
                        version = %receipt.version,
                        attempt,
                        "Registration committed"
                    );
                    self.spawn_confirmation(*event_id, &registration);
                    return Ok(registration);
                }
                Err(CommitError::PreconditionFailed {
                    expected, actual, ..
                }) => {
                    tracing::warn!(
                        event_id = %event_id,
                        attempt,
                        expected = %expected,
                        actual = %actual,
                        "Commit lost an optimistic race; retrying from a fresh read"
                    );
                }
                Err(CommitError::DuplicateRegistrant {
                    registrant_key, ..
                }) => {
                    // The atomic re-check caught a duplicate that landed
                    // between our read and our commit.
                    return Err(RegistrationError::AlreadyRegistered {
                        event_id: *event_id,
                        registrant_key,
                    });
                }
                Err(CommitError::EventMissing(id)) => {
                    return Err(RegistrationError::EventNotFound(id));
                }
                Err(CommitError::Store(error)) => {
                    return Err(RegistrationError::StoreUnavailable(error));
                }
            }
        }

        Err(RegistrationError::Conflict {
            event_id: *event_id,
            attempts: max_attempts,
        })
    }

    /// Current availability of one event, observed at the engine's clock.
    ///
    /// Read-only. A full or past-deadline event whose stored status is
    /// still `Active` is reported as `Closed` without any write taking
    /// place.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EventNotFound`]: no event with this id
    /// - [`RegistrationError::StoreUnavailable`]: infrastructure failure
    pub async fn availability(
        &self,
        event_id: &EventId,
    ) -> Result<Availability, RegistrationError> {
        let snapshot = self
            .store
            .load_event(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(*event_id))?;
        Ok(snapshot.availability(self.clock.now()))
    }

    fn spawn_confirmation(&self, event_id: EventId, registration: &Registration) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let notice = Notice::RegistrationConfirmed {
            event_id,
            registrant_key: registration.registrant_key.clone(),
            party_size: registration.party_size,
            registered_at: registration.registered_at,
        };
        tokio::spawn(async move {
            if let Err(error) = dispatcher.dispatch(notice).await {
                tracing::warn!(
                    event_id = %event_id,
                    error = %error,
                    "Confirmation dispatch failed"
                );
            }
        });
    }
}

fn rejection(event_id: EventId, reason: RejectReason) -> RegistrationError {
    match reason {
        RejectReason::EventNotOpen { status } => {
            RegistrationError::EventNotOpen { event_id, status }
        }
        RejectReason::DeadlinePassed { deadline } => {
            RegistrationError::DeadlinePassed { event_id, deadline }
        }
        RejectReason::CapacityExceeded {
            requested,
            remaining,
        } => RegistrationError::CapacityExceeded {
            event_id,
            requested,
            remaining,
        },
    }
}
