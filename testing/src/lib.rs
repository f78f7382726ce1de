//! # Guestlist Testing
//!
//! Testing utilities and mock implementations for the Guestlist
//! registration engine.
//!
//! This crate provides:
//! - Mock implementations of the environment traits (clock, dispatcher)
//! - An in-memory [`EventStore`](guestlist_core::store::EventStore) with
//!   real conditional-commit semantics, so concurrency tests exercise
//!   genuine races
//! - Failure-injecting stores for the contention and outage paths
//! - A fluent snapshot builder for fixtures
//!
//! ## Example
//!
//! ```
//! use guestlist_testing::{EventSnapshotBuilder, InMemoryEventStore, test_clock};
//! use guestlist_core::environment::Clock;
//!
//! let store = InMemoryEventStore::new();
//! store.insert(EventSnapshotBuilder::new().capacity(2).build());
//! assert_eq!(store.len(), 1);
//!
//! let clock = test_clock();
//! assert_eq!(clock.now(), clock.now());
//! ```

use chrono::{DateTime, Utc};
use guestlist_core::environment::Clock;

/// In-memory and failure-injecting event stores
pub mod store;

/// Fluent builders for event snapshot fixtures
pub mod builders;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use guestlist_core::notify::{Notice, NotificationDispatcher, NotifyError};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use guestlist_testing::mocks::FixedClock;
    /// use guestlist_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-06-01 12:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Dispatcher that records every notice it is handed.
    ///
    /// The engine dispatches notifications on spawned tasks, so assertions
    /// go through [`RecordingDispatcher::wait_until`] rather than reading
    /// immediately after the registration returns.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingDispatcher {
        sent: Arc<Mutex<Vec<Notice>>>,
    }

    impl RecordingDispatcher {
        /// Create a new empty recording dispatcher
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of every notice dispatched so far
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned (a test already panicked).
        #[must_use]
        #[allow(clippy::unwrap_used)]
        pub fn sent(&self) -> Vec<Notice> {
            self.sent.lock().unwrap().clone()
        }

        /// Block (cooperatively) until at least `count` notices arrived.
        ///
        /// # Panics
        ///
        /// Panics if the count is not reached within roughly one second;
        /// a fire-and-forget dispatch that has not landed by then is lost.
        #[allow(clippy::unwrap_used, clippy::panic)]
        pub async fn wait_until(&self, count: usize) {
            for _ in 0..1_000 {
                if self.sent.lock().unwrap().len() >= count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            panic!(
                "timed out waiting for {count} notifications (got {})",
                self.sent.lock().unwrap().len()
            );
        }
    }

    impl NotificationDispatcher for RecordingDispatcher {
        #[allow(clippy::unwrap_used)]
        fn dispatch(
            &self,
            notice: Notice,
        ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
            Box::pin(async move {
                self.sent.lock().unwrap().push(notice);
                Ok(())
            })
        }
    }

    /// Dispatcher that fails every dispatch.
    ///
    /// Used to show that a broken notification channel never changes a
    /// registration result.
    #[derive(Debug, Default)]
    pub struct FailingDispatcher {
        attempts: AtomicUsize,
    }

    impl FailingDispatcher {
        /// Create a new failing dispatcher
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// How many dispatches were attempted
        #[must_use]
        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl NotificationDispatcher for FailingDispatcher {
        fn dispatch(
            &self,
            _notice: Notice,
        ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(NotifyError("delivery channel down".to_string())) })
        }
    }
}

// Re-export commonly used items
pub use builders::EventSnapshotBuilder;
pub use mocks::{FailingDispatcher, FixedClock, RecordingDispatcher, test_clock};
pub use store::{ConflictingEventStore, FailingEventStore, InMemoryEventStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[tokio::test]
    async fn recording_dispatcher_records_in_order() {
        use guestlist_core::event::{Capacity, EventId};
        use guestlist_core::notify::{Notice, NotificationDispatcher};

        let dispatcher = RecordingDispatcher::new();
        let first = Notice::EventCreated {
            event_id: EventId::new(),
            capacity: Capacity::new(1),
            registration_opens_until: Utc::now(),
        };
        let second = Notice::EventCreated {
            event_id: EventId::new(),
            capacity: Capacity::new(2),
            registration_opens_until: Utc::now(),
        };

        dispatcher.dispatch(first.clone()).await.ok();
        dispatcher.dispatch(second.clone()).await.ok();

        assert_eq!(dispatcher.sent(), vec![first, second]);
    }

    #[tokio::test]
    async fn failing_dispatcher_counts_attempts() {
        use guestlist_core::event::{Capacity, EventId};
        use guestlist_core::notify::{Notice, NotificationDispatcher};

        let dispatcher = FailingDispatcher::new();
        let notice = Notice::EventCreated {
            event_id: EventId::new(),
            capacity: Capacity::new(1),
            registration_opens_until: Utc::now(),
        };

        assert!(dispatcher.dispatch(notice).await.is_err());
        assert_eq!(dispatcher.attempts(), 1);
    }
}
