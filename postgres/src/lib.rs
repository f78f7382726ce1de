//! # Guestlist Postgres
//!
//! PostgreSQL-backed [`EventStore`](guestlist_core::store::EventStore) for
//! the Guestlist registration engine.
//!
//! The optimistic-concurrency contract is pushed into SQL: loading is one
//! SELECT joining registrant keys, and committing is one transaction whose
//! guarded UPDATE only lands when the event still looks exactly like the
//! snapshot the admission decision was computed on.
//!
//! Queries are built at runtime with `sqlx::query`; no database is needed
//! at compile time.
//!
//! ## Example
//!
//! ```no_run
//! use guestlist_postgres::{PostgresConfig, PostgresEventStore, migrate};
//!
//! # async fn example() -> Result<(), guestlist_core::store::StoreError> {
//! let store = PostgresEventStore::connect(&PostgresConfig::from_env()).await?;
//! migrate(store.pool()).await?;
//! # Ok(())
//! # }
//! ```

/// Connection configuration from environment variables
pub mod config;

/// The store implementation and schema migration
pub mod store;

pub use config::PostgresConfig;
pub use store::{PostgresEventStore, migrate};
