//! # Guestlist Core
//!
//! Domain types and abstractions for the Guestlist registration engine.
//!
//! This crate holds everything that can be reasoned about without I/O: the
//! event model, registration records, the pure admission gate, duplicate
//! detection, the optimistic-concurrency store contract, the error taxonomy,
//! and the clock and notification seams.
//!
//! ## Core Concepts
//!
//! - **`EventSnapshot`**: a point-in-time read of one event (capacity,
//!   committed count, deadline, status, registrants, version)
//! - **Gate**: pure function `(snapshot, party size, now) → Decision`,
//!   first matching rule wins
//! - **Conditional commit**: the store appends a registration only if the
//!   snapshot's version and count still hold, atomically with a registrant
//!   uniqueness check
//! - **Observed status**: "closed because full or past deadline" is computed
//!   at query time, never written back
//!
//! ## Flow
//!
//! ```text
//! load snapshot ──► validate party size ──► duplicate check ──► gate
//!                                                                │ admit
//!                                                                ▼
//!                              retry on lost race ◄── conditional commit
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use guestlist_core::{EventStore, PartySize, RegistrantKey};
//! use guestlist_engine::RegistrationEngine;
//!
//! let engine = RegistrationEngine::new(store, clock, dispatcher);
//! let registration = engine
//!     .register(&event_id, RegistrantKey::new("alice"), PartySize::new(2), "")
//!     .await?;
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Injected dependencies: the clock
pub mod environment;

/// Caller-visible error taxonomy for registration operations
pub mod error;

/// Event model: identity, capacity, lifecycle status, snapshots
pub mod event;

/// The capacity gate: pure admission decisions
pub mod gate;

/// Duplicate-registrant detection
pub mod idempotency;

/// Notification abstraction for confirmation messages
pub mod notify;

/// Registration records and their identifying types
pub mod registration;

/// Storage abstraction with optimistic concurrency control
pub mod store;

pub use environment::{Clock, SystemClock};
pub use error::RegistrationError;
pub use event::{Availability, Capacity, EventId, EventSnapshot, EventStatus};
pub use gate::{Decision, RejectReason, decide};
pub use idempotency::already_registered;
pub use notify::{NoopDispatcher, Notice, NotificationDispatcher, NotifyError};
pub use registration::{PartySize, RegistrantKey, Registration};
pub use store::{CommitError, CommitReceipt, EventStore, ExpectedState, StoreError, Version};
