//! # Guestlist Engine
//!
//! The orchestration layer of the Guestlist registration system.
//!
//! [`RegistrationEngine`] drives the flow that `guestlist-core` defines the
//! pieces of: load a snapshot, validate, check idempotency, run the
//! admission rules, then commit atomically under optimistic concurrency.
//! A lost race is retried from a fresh read up to a configurable cap; a
//! successful commit spawns a fire-and-forget confirmation notice.
//!
//! ## Example
//!
//! ```
//! use guestlist_core::registration::{PartySize, RegistrantKey};
//! use guestlist_engine::RegistrationEngine;
//! use guestlist_testing::{EventSnapshotBuilder, InMemoryEventStore, RecordingDispatcher, test_clock};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(InMemoryEventStore::new());
//! let event = EventSnapshotBuilder::new().capacity(2).build();
//! let event_id = event.id;
//! store.insert(event);
//!
//! let engine = RegistrationEngine::new(
//!     store,
//!     Arc::new(test_clock()),
//!     Arc::new(RecordingDispatcher::new()),
//! );
//!
//! let registration = engine
//!     .register(&event_id, RegistrantKey::new("alice"), PartySize::new(1), "")
//!     .await
//!     .unwrap();
//! assert_eq!(registration.party_size.value(), 1);
//! # }
//! ```

/// Engine configuration
pub mod config;

/// The registration engine
pub mod engine;

// Re-export commonly used items
pub use config::EngineConfig;
pub use engine::RegistrationEngine;
