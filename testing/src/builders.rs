//! Fluent builders for test fixtures.

use crate::mocks::test_clock;
use chrono::{DateTime, Duration, Utc};
use guestlist_core::environment::Clock;
use guestlist_core::event::{Capacity, EventId, EventSnapshot, EventStatus};
use guestlist_core::registration::RegistrantKey;
use guestlist_core::store::Version;
use std::collections::HashSet;

/// Builder for [`EventSnapshot`] fixtures.
///
/// Defaults to an open event: capacity 10, nobody registered, deadline one
/// day after [`test_clock`], stored status `Active`, initial version.
///
/// # Example
///
/// ```
/// use guestlist_testing::EventSnapshotBuilder;
/// use guestlist_core::event::EventStatus;
///
/// let event = EventSnapshotBuilder::new()
///     .capacity(2)
///     .registered(1)
///     .registrant("alice")
///     .build();
///
/// assert_eq!(event.remaining(), 1);
/// assert_eq!(event.status, EventStatus::Active);
/// ```
#[derive(Debug, Clone)]
pub struct EventSnapshotBuilder {
    id: EventId,
    capacity: Capacity,
    registered_count: u32,
    registration_opens_until: DateTime<Utc>,
    status: EventStatus,
    registrants: HashSet<RegistrantKey>,
    version: Version,
}

impl EventSnapshotBuilder {
    /// Start from the default open-event fixture.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: EventId::new(),
            capacity: Capacity::new(10),
            registered_count: 0,
            registration_opens_until: test_clock().now() + Duration::days(1),
            status: EventStatus::Active,
            registrants: HashSet::new(),
            version: Version::INITIAL,
        }
    }

    /// Use a specific event id.
    #[must_use]
    pub const fn id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    /// Set the seat budget.
    #[must_use]
    pub const fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Capacity::new(capacity);
        self
    }

    /// Set the committed count.
    ///
    /// Independent of [`EventSnapshotBuilder::registrant`]; a fixture that
    /// needs both a count and the keys behind it sets both explicitly.
    #[must_use]
    pub const fn registered(mut self, count: u32) -> Self {
        self.registered_count = count;
        self
    }

    /// Set the registration deadline.
    #[must_use]
    pub const fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.registration_opens_until = deadline;
        self
    }

    /// Set the stored lifecycle status.
    #[must_use]
    pub const fn status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a committed registrant key.
    #[must_use]
    pub fn registrant(mut self, key: impl Into<RegistrantKey>) -> Self {
        self.registrants.insert(key.into());
        self
    }

    /// Set the optimistic-concurrency version.
    #[must_use]
    pub const fn version(mut self, version: u64) -> Self {
        self.version = Version::new(version);
        self
    }

    /// Produce the snapshot.
    #[must_use]
    pub fn build(self) -> EventSnapshot {
        EventSnapshot {
            id: self.id,
            capacity: self.capacity,
            registered_count: self.registered_count,
            registration_opens_until: self.registration_opens_until,
            status: self.status,
            registrants: self.registrants,
            version: self.version,
        }
    }
}

impl Default for EventSnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
