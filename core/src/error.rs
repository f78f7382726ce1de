//! The caller-visible error taxonomy for registration operations.
//!
//! One variant per distinct outcome, so callers can branch without parsing
//! message strings. Only [`RegistrationError::Conflict`] is transient;
//! everything else reports a fact about the request or the event that a
//! blind retry would not change.

use crate::event::{EventId, EventStatus};
use crate::registration::RegistrantKey;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a registration operation did not return a committed registration.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// No event with this id exists.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The requested party size is below the minimum of one seat.
    #[error("Invalid party size: {requested} (must be at least 1)")]
    InvalidPartySize {
        /// The party size that was requested.
        requested: u32,
    },

    /// The event's stored status does not accept registrations.
    #[error("Event {event_id} is not open for registration (status: {status})")]
    EventNotOpen {
        /// The event that refused the registration.
        event_id: EventId,
        /// Its stored status.
        status: EventStatus,
    },

    /// The registration deadline lies strictly in the past.
    #[error("Registration deadline for event {event_id} passed at {deadline}")]
    DeadlinePassed {
        /// The event that refused the registration.
        event_id: EventId,
        /// The deadline that was missed.
        deadline: DateTime<Utc>,
    },

    /// The party does not fit the remaining headroom.
    ///
    /// The message names the headroom so a caller can offer it back to the
    /// registrant ("only 1 seat left").
    #[error(
        "Capacity exceeded for event {event_id}: requested {requested}, only {remaining} remaining"
    )]
    CapacityExceeded {
        /// The event that refused the registration.
        event_id: EventId,
        /// Seats the party asked for.
        requested: u32,
        /// Headroom still available (may be 0).
        remaining: u32,
    },

    /// A registration with an equal key already exists on this event.
    #[error("Registrant {registrant_key} is already registered for event {event_id}")]
    AlreadyRegistered {
        /// The event the duplicate was aimed at.
        event_id: EventId,
        /// The key that already exists.
        registrant_key: RegistrantKey,
    },

    /// Every commit attempt lost its optimistic race.
    ///
    /// Transient: the event is simply contended right now, and the whole
    /// operation may be retried by the caller.
    #[error("Registration for event {event_id} conflicted on all {attempts} attempts; try again")]
    Conflict {
        /// The contended event.
        event_id: EventId,
        /// How many commit attempts were made.
        attempts: usize,
    },

    /// The store itself failed; distinct from contention and never retried.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl RegistrationError {
    /// Whether retrying the whole operation later may succeed unchanged.
    ///
    /// True only for [`RegistrationError::Conflict`].
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_exceeded_message_names_the_headroom() {
        let error = RegistrationError::CapacityExceeded {
            event_id: EventId::new(),
            requested: 2,
            remaining: 1,
        };

        let display = format!("{error}");
        assert!(display.contains("requested 2"));
        assert!(display.contains("only 1 remaining"));
    }

    #[test]
    fn only_conflict_is_transient() {
        let event_id = EventId::new();

        assert!(
            RegistrationError::Conflict {
                event_id,
                attempts: 4
            }
            .is_transient()
        );

        assert!(!RegistrationError::EventNotFound(event_id).is_transient());
        assert!(!RegistrationError::InvalidPartySize { requested: 0 }.is_transient());
        assert!(
            !RegistrationError::AlreadyRegistered {
                event_id,
                registrant_key: RegistrantKey::new("alice"),
            }
            .is_transient()
        );
        assert!(
            !RegistrationError::StoreUnavailable(StoreError::Connection("refused".to_string()))
                .is_transient()
        );
    }

    #[test]
    fn store_errors_convert_without_losing_detail() {
        let error: RegistrationError =
            StoreError::Database("deadlock detected".to_string()).into();
        assert!(format!("{error}").contains("deadlock detected"));
        assert!(matches!(error, RegistrationError::StoreUnavailable(_)));
    }

    #[test]
    fn deadline_message_names_the_deadline() {
        #[allow(clippy::expect_used)] // Panics: Test will fail if parse fails
        let deadline = DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .expect("valid RFC3339 timestamp")
            .with_timezone(&Utc);
        let error = RegistrationError::DeadlinePassed {
            event_id: EventId::new(),
            deadline,
        };
        assert!(format!("{error}").contains("2025-06-01 12:00:00 UTC"));
    }
}
