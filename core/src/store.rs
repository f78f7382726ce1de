//! Storage abstraction with optimistic concurrency control.
//!
//! This module defines the seam between the registration engine and whatever
//! holds event state. The contract has exactly two operations: load one
//! event's snapshot, and conditionally commit one registration against the
//! state that snapshot was read at.
//!
//! # Design
//!
//! The commit is the whole concurrency story. It must, in one atomic step:
//!
//! - verify the event's [`Version`] and registered count still match the
//!   caller's [`ExpectedState`],
//! - verify the party still fits under capacity,
//! - verify no registration with the same key exists,
//! - append the registration and bump count and version.
//!
//! Any interleaved writer makes the precondition fail; nothing is written
//! and the caller re-reads. Overbooking is therefore impossible no matter
//! how requests interleave.
//!
//! # Implementations
//!
//! - `PostgresEventStore` (in `guestlist-postgres`): production, one guarded
//!   UPDATE inside a transaction
//! - `InMemoryEventStore` (in `guestlist-testing`): fast, deterministic tests

use crate::event::{EventId, EventSnapshot};
use crate::registration::{RegistrantKey, Registration};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Event version number for optimistic concurrency control.
///
/// Versions start at 0 for a fresh event and increment by 1 on every
/// committed registration. A commit names the version it read; if the
/// stored version has moved, the commit fails instead of overwriting.
///
/// # Examples
///
/// ```
/// use guestlist_core::store::Version;
///
/// let v0 = Version::INITIAL;
/// let v1 = v0.next();
/// assert_eq!(v1, Version::new(1));
/// assert_eq!(v1.value(), 1);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    /// The initial version (0) for a fresh event.
    pub const INITIAL: Self = Self(0);

    /// Create a new `Version` with the given value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the version number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Get the next version (current + 1).
    ///
    /// # Overflow Behavior
    ///
    /// Reaching `u64::MAX` commits on a single event is not a realistic
    /// concern; plain addition is used.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Check if this is the initial version (0).
    #[must_use]
    pub const fn is_initial(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// The precondition a conditional commit is made against.
///
/// Both fields come from the snapshot the admission decision was computed
/// on. The version alone would suffice; carrying the count as well lets a
/// store cross-check the capacity arithmetic in the same breath.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedState {
    /// Version the snapshot was read at
    pub version: Version,
    /// Registered count the snapshot was read at
    pub registered_count: u32,
}

/// What the store reports after a successful commit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Version after the commit
    pub version: Version,
    /// Registered count after the commit
    pub registered_count: u32,
}

/// Infrastructure failure while talking to the store.
///
/// Deliberately separate from [`CommitError::PreconditionFailed`]: losing an
/// optimistic race is a normal, retryable outcome; a broken store is not,
/// and is never retried.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query or statement execution failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Could not reach the store at all.
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Why a conditional commit did not commit.
#[derive(Error, Debug)]
pub enum CommitError {
    /// The event moved on since the snapshot was read.
    ///
    /// Another writer committed in between. Nothing was written; re-read
    /// and decide again.
    #[error("Commit precondition failed for event {event_id}: expected version {expected}, found {actual}")]
    PreconditionFailed {
        /// The event where the conflict occurred.
        event_id: EventId,
        /// The version the commit was conditioned on.
        expected: Version,
        /// The version actually found.
        actual: Version,
    },

    /// A registration with this key already exists on the event.
    ///
    /// This is the atomic closing of the idempotency race window: the
    /// engine's fail-fast check can miss a duplicate that lands between
    /// read and commit, the store cannot.
    #[error("Registrant {registrant_key} is already registered for event {event_id}")]
    DuplicateRegistrant {
        /// The event the duplicate was aimed at.
        event_id: EventId,
        /// The key that already exists.
        registrant_key: RegistrantKey,
    },

    /// The event vanished between read and commit.
    #[error("Event not found: {0}")]
    EventMissing(EventId),

    /// Infrastructure failure; see [`StoreError`].
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommitError {
    /// Whether a fresh read and a new commit attempt can resolve this error.
    ///
    /// Only a lost optimistic race qualifies.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }
}

/// Store abstraction for event snapshots and conditional registration commits.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to be safely shared across tasks.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of
/// `async fn` to enable trait object usage (`Arc<dyn EventStore>`), which is
/// how the engine holds its store.
pub trait EventStore: Send + Sync {
    /// Load the current snapshot of one event.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no event with this id exists; absence is an answer,
    /// not an error.
    ///
    /// # Errors
    ///
    /// - `StoreError::Database`: query failed
    /// - `StoreError::Connection`: store unreachable
    fn load_event(
        &self,
        event_id: &EventId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<EventSnapshot>, StoreError>> + Send + '_>>;

    /// Atomically commit one registration, conditioned on `expected`.
    ///
    /// In one atomic step the store must: check the version and count still
    /// match `expected`, check the party fits under capacity, check the
    /// registrant key is not already present, then append the registration
    /// and bump count and version. A failed check writes nothing.
    ///
    /// # Errors
    ///
    /// - `CommitError::PreconditionFailed`: another writer landed first
    ///   (retryable with a fresh read)
    /// - `CommitError::DuplicateRegistrant`: key already registered
    /// - `CommitError::EventMissing`: event deleted since the read
    /// - `CommitError::Store`: infrastructure failure
    fn commit_registration(
        &self,
        event_id: &EventId,
        expected: ExpectedState,
        registration: Registration,
    ) -> Pin<Box<dyn Future<Output = Result<CommitReceipt, CommitError>> + Send + '_>>;
}
