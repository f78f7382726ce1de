//! Event model: identity, capacity, lifecycle status, and point-in-time snapshots.
//!
//! An event here is a capacity-limited gathering people register for, not an
//! event-sourcing record. The central type is [`EventSnapshot`], a consistent
//! read of one event used both to decide admission and to answer availability
//! queries.

use crate::registration::RegistrantKey;
use crate::store::{ExpectedState, Version};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
///
/// # Examples
///
/// ```
/// use guestlist_core::event::EventId;
///
/// let id = EventId::new();
/// let same = EventId::from_uuid(*id.as_uuid());
/// assert_eq!(id, same);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Fixed seat budget for an event.
///
/// Zero is representable: such an event exists but no registration can ever
/// be admitted against it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capacity(pub u32);

impl Capacity {
    /// Creates a new `Capacity`
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the capacity value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Lifecycle status
// ============================================================================

/// Error type for `EventStatus` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown event status: {0}")]
pub struct ParseEventStatusError(String);

/// Event lifecycle status.
///
/// `Closed` and `Cancelled` are terminal: once an event reaches either, no
/// operation transitions it anywhere else. The stored status is what the
/// admission rules consult; a *full* event keeps its stored `Active` status
/// and is only reported as closed by [`EventSnapshot::observed_status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Registration may be attempted (deadline and capacity permitting)
    Active,
    /// Registration window ended
    Closed,
    /// Event called off
    Cancelled,
}

impl EventStatus {
    /// Check whether this status is terminal.
    ///
    /// # Examples
    ///
    /// ```
    /// use guestlist_core::event::EventStatus;
    ///
    /// assert!(!EventStatus::Active.is_terminal());
    /// assert!(EventStatus::Closed.is_terminal());
    /// assert!(EventStatus::Cancelled.is_terminal());
    /// ```
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }

    /// Check whether a transition to `next` is permitted.
    ///
    /// Only `Active → Closed` and `Active → Cancelled` are valid; terminal
    /// statuses permit nothing, including re-entry to themselves.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Active, Self::Closed | Self::Cancelled))
    }

    /// Storage representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = ParseEventStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseEventStatusError(other.to_string())),
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// A point-in-time read of one event, as loaded from the store.
///
/// The snapshot carries everything the admission rules need (capacity,
/// committed count, deadline, stored status, committed registrant keys) plus
/// the optimistic-concurrency [`Version`] the read was made at. A commit is
/// conditioned on [`EventSnapshot::expected_state`]; if any other writer
/// landed in between, the commit fails and the caller re-reads.
///
/// # Invariants
///
/// `registered_count` never exceeds `capacity` and only grows; registrations
/// are append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSnapshot {
    /// Unique event identifier
    pub id: EventId,
    /// Fixed seat budget
    pub capacity: Capacity,
    /// Sum of committed party sizes
    pub registered_count: u32,
    /// Last instant (inclusive) at which registration is allowed
    pub registration_opens_until: DateTime<Utc>,
    /// Stored lifecycle status
    pub status: EventStatus,
    /// Keys of committed registrations
    pub registrants: HashSet<RegistrantKey>,
    /// Optimistic-concurrency token this read was made at
    pub version: Version,
}

impl EventSnapshot {
    /// Creates a fresh, empty, active snapshot at the initial version.
    #[must_use]
    pub fn new(id: EventId, capacity: Capacity, registration_opens_until: DateTime<Utc>) -> Self {
        Self {
            id,
            capacity,
            registered_count: 0,
            registration_opens_until,
            status: EventStatus::Active,
            registrants: HashSet::new(),
            version: Version::INITIAL,
        }
    }

    /// Remaining headroom (saturating; never negative).
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.value().saturating_sub(self.registered_count)
    }

    /// Whether every seat is committed.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether a party of `party_size` fits into the remaining headroom.
    ///
    /// Computed in `u64` so `count + party` cannot overflow.
    #[must_use]
    pub const fn can_accommodate(&self, party_size: u32) -> bool {
        (self.registered_count as u64) + (party_size as u64) <= self.capacity.value() as u64
    }

    /// Whether `now` is strictly after the registration deadline.
    ///
    /// The deadline itself is inside the window: registering at exactly
    /// `registration_opens_until` is allowed.
    #[must_use]
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now > self.registration_opens_until
    }

    /// The precondition a commit against this snapshot is conditioned on.
    #[must_use]
    pub const fn expected_state(&self) -> ExpectedState {
        ExpectedState {
            version: self.version,
            registered_count: self.registered_count,
        }
    }

    /// Status as observed at `now`, for read-only reporting.
    ///
    /// A stored terminal status wins. Otherwise a full event, or one whose
    /// deadline has passed, is *observed* as `Closed` without any write ever
    /// taking place; the stored status stays `Active`.
    #[must_use]
    pub fn observed_status(&self, now: DateTime<Utc>) -> EventStatus {
        if self.status.is_terminal() {
            self.status
        } else if self.deadline_passed(now) || self.is_full() {
            EventStatus::Closed
        } else {
            EventStatus::Active
        }
    }

    /// Availability as observed at `now`.
    #[must_use]
    pub fn availability(&self, now: DateTime<Utc>) -> Availability {
        Availability {
            event_id: self.id,
            capacity: self.capacity,
            registered_count: self.registered_count,
            remaining: self.remaining(),
            status: self.observed_status(now),
        }
    }
}

// ============================================================================
// Availability (read model)
// ============================================================================

/// Read-only answer to "how full is this event, and is it open?".
///
/// `status` is the observed interpretation from
/// [`EventSnapshot::observed_status`], not necessarily the stored status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Event this answer describes
    pub event_id: EventId,
    /// Fixed seat budget
    pub capacity: Capacity,
    /// Sum of committed party sizes
    pub registered_count: u32,
    /// Headroom still available
    pub remaining: u32,
    /// Observed lifecycle status
    pub status: EventStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[allow(clippy::expect_used)] // Panics: Test will fail if parse fails
    fn deadline() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .expect("valid RFC3339 timestamp")
            .with_timezone(&Utc)
    }

    fn snapshot(capacity: u32, registered: u32) -> EventSnapshot {
        EventSnapshot {
            registered_count: registered,
            ..EventSnapshot::new(EventId::new(), Capacity::new(capacity), deadline())
        }
    }

    mod status_tests {
        use super::*;

        #[test]
        fn terminal_statuses() {
            assert!(!EventStatus::Active.is_terminal());
            assert!(EventStatus::Closed.is_terminal());
            assert!(EventStatus::Cancelled.is_terminal());
        }

        #[test]
        fn only_active_transitions_out() {
            assert!(EventStatus::Active.can_transition_to(EventStatus::Closed));
            assert!(EventStatus::Active.can_transition_to(EventStatus::Cancelled));
            assert!(!EventStatus::Active.can_transition_to(EventStatus::Active));
            assert!(!EventStatus::Closed.can_transition_to(EventStatus::Active));
            assert!(!EventStatus::Closed.can_transition_to(EventStatus::Cancelled));
            assert!(!EventStatus::Cancelled.can_transition_to(EventStatus::Closed));
        }

        #[test]
        #[allow(clippy::expect_used)] // Panics: Test will fail if parse fails
        fn round_trips_through_storage_form() {
            for status in [EventStatus::Active, EventStatus::Closed, EventStatus::Cancelled] {
                let parsed: EventStatus =
                    status.as_str().parse().expect("storage form should parse");
                assert_eq!(parsed, status);
            }
        }

        #[test]
        fn unknown_status_fails_to_parse() {
            assert!("completed".parse::<EventStatus>().is_err());
            assert!("".parse::<EventStatus>().is_err());
            assert!("Active".parse::<EventStatus>().is_err());
        }

        #[test]
        fn display_matches_storage_form() {
            assert_eq!(format!("{}", EventStatus::Active), "active");
            assert_eq!(format!("{}", EventStatus::Cancelled), "cancelled");
        }
    }

    mod snapshot_tests {
        use super::*;

        #[test]
        fn remaining_saturates() {
            assert_eq!(snapshot(10, 3).remaining(), 7);
            assert_eq!(snapshot(10, 10).remaining(), 0);
            assert_eq!(snapshot(0, 0).remaining(), 0);
        }

        #[test]
        fn full_detection() {
            assert!(!snapshot(2, 1).is_full());
            assert!(snapshot(2, 2).is_full());
            assert!(snapshot(0, 0).is_full());
        }

        #[test]
        fn accommodation_never_overflows() {
            let event = snapshot(u32::MAX, u32::MAX - 1);
            assert!(event.can_accommodate(1));
            assert!(!event.can_accommodate(2));
            assert!(!event.can_accommodate(u32::MAX));
        }

        #[test]
        fn deadline_is_inclusive() {
            let event = snapshot(5, 0);
            assert!(!event.deadline_passed(deadline() - Duration::seconds(1)));
            assert!(!event.deadline_passed(deadline()));
            assert!(event.deadline_passed(deadline() + Duration::microseconds(1)));
        }

        #[test]
        fn expected_state_mirrors_the_read() {
            let event = snapshot(5, 3);
            let expected = event.expected_state();
            assert_eq!(expected.version, Version::INITIAL);
            assert_eq!(expected.registered_count, 3);
        }

        #[test]
        fn observed_status_prefers_stored_terminal() {
            let mut event = snapshot(5, 5);
            event.status = EventStatus::Cancelled;
            // Full AND past deadline, but Cancelled wins.
            assert_eq!(
                event.observed_status(deadline() + Duration::days(1)),
                EventStatus::Cancelled
            );
        }

        #[test]
        fn observed_status_closes_full_events_without_writing() {
            let event = snapshot(5, 5);
            assert_eq!(event.status, EventStatus::Active);
            assert_eq!(event.observed_status(deadline()), EventStatus::Closed);
            // The stored status is untouched.
            assert_eq!(event.status, EventStatus::Active);
        }

        #[test]
        fn observed_status_closes_past_deadline() {
            let event = snapshot(5, 0);
            assert_eq!(
                event.observed_status(deadline() + Duration::seconds(1)),
                EventStatus::Closed
            );
            assert_eq!(event.observed_status(deadline()), EventStatus::Active);
        }

        #[test]
        fn availability_reports_observed_status() {
            let event = snapshot(4, 4);
            let availability = event.availability(deadline());
            assert_eq!(availability.event_id, event.id);
            assert_eq!(availability.capacity, Capacity::new(4));
            assert_eq!(availability.registered_count, 4);
            assert_eq!(availability.remaining, 0);
            assert_eq!(availability.status, EventStatus::Closed);
        }
    }
}
