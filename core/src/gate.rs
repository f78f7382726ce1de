//! The capacity gate: a pure admission decision over one event snapshot.
//!
//! [`decide`] looks at a snapshot, a party size, and an instant, and answers
//! whether the registration may proceed. It performs no I/O, reads no clock,
//! and mutates nothing; the engine owns all of that. Being pure makes every
//! boundary case directly testable.
//!
//! # Rule order
//!
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. stored status is not `Active` → [`RejectReason::EventNotOpen`]
//! 2. `now` strictly after the deadline → [`RejectReason::DeadlinePassed`]
//!    (the deadline instant itself still admits)
//! 3. party does not fit the remaining headroom →
//!    [`RejectReason::CapacityExceeded`]
//! 4. otherwise → [`Decision::Admit`]
//!
//! The order is observable: a full event that is also past its deadline
//! reports `DeadlinePassed`, and a cancelled event reports `EventNotOpen`
//! no matter how full or stale it is. Rule 1 consults the *stored* status
//! only, so a full-but-active event falls through to rule 3 rather than
//! claiming the event is not open.

use crate::event::{EventSnapshot, EventStatus};
use crate::registration::PartySize;
use chrono::{DateTime, Utc};

/// Outcome of the capacity gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Registration may proceed to the conditional commit.
    Admit,
    /// Registration is refused; nothing may be written.
    Reject(RejectReason),
}

impl Decision {
    /// Whether this decision admits the registration.
    #[must_use]
    pub const fn is_admit(self) -> bool {
        matches!(self, Self::Admit)
    }
}

/// Why the gate refused a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The stored status is not `Active`.
    EventNotOpen {
        /// The stored status that blocked admission.
        status: EventStatus,
    },
    /// The registration deadline lies strictly before `now`.
    DeadlinePassed {
        /// The deadline that was missed.
        deadline: DateTime<Utc>,
    },
    /// The party does not fit the remaining headroom.
    CapacityExceeded {
        /// Seats the party asked for.
        requested: u32,
        /// Headroom still available (may be 0).
        remaining: u32,
    },
}

/// Decide admission for one registration attempt.
///
/// Callers validate `party_size >= 1` before invoking the gate; the gate
/// itself only checks the rules above, in order.
#[must_use]
pub fn decide(event: &EventSnapshot, party_size: PartySize, now: DateTime<Utc>) -> Decision {
    if event.status != EventStatus::Active {
        return Decision::Reject(RejectReason::EventNotOpen {
            status: event.status,
        });
    }

    if event.deadline_passed(now) {
        return Decision::Reject(RejectReason::DeadlinePassed {
            deadline: event.registration_opens_until,
        });
    }

    if !event.can_accommodate(party_size.value()) {
        return Decision::Reject(RejectReason::CapacityExceeded {
            requested: party_size.value(),
            remaining: event.remaining(),
        });
    }

    Decision::Admit
}
