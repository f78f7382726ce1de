//! PostgreSQL-backed event store.
//!
//! Two tables back the whole model: `events` holds one row per event with
//! its capacity, committed count, status and version; `registrations` holds
//! one append-only row per committed registration, keyed by
//! `(event_id, registrant_key)`. CHECK constraints restate the domain
//! invariants at the storage layer, so even a buggy writer cannot persist
//! an overbooked or negative count.
//!
//! # Commit protocol
//!
//! [`EventStore::commit_registration`] runs one transaction:
//!
//! 1. `INSERT ... ON CONFLICT DO NOTHING` into `registrations`. Zero rows
//!    affected means the key already exists; the commit fails with
//!    [`CommitError::DuplicateRegistrant`] before the event row is touched.
//! 2. A guarded `UPDATE` on `events`, conditioned on the version and count
//!    the caller read and on the party still fitting under capacity. Zero
//!    rows means the precondition no longer holds; a probe SELECT
//!    distinguishes a vanished event from a lost race.
//!
//! A failed step drops the transaction, rolling the INSERT back, so a
//! refused commit writes nothing. The row lock taken by the UPDATE orders
//! concurrent commits on the same event; the loser re-evaluates the guard
//! against the winner's row, matches nothing, and reports
//! [`CommitError::PreconditionFailed`].

use crate::config::PostgresConfig;
use chrono::{DateTime, Utc};
use guestlist_core::event::{Capacity, EventId, EventSnapshot, EventStatus};
use guestlist_core::registration::{RegistrantKey, Registration};
use guestlist_core::store::{
    CommitError, CommitReceipt, EventStore, ExpectedState, StoreError, Version,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Create the schema if it does not already exist.
///
/// Idempotent; safe to run on every startup. Creates the `events` and
/// `registrations` tables plus supporting indexes.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if a DDL statement fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS events (
            id UUID PRIMARY KEY,
            capacity INT NOT NULL CHECK (capacity >= 0),
            registered_count INT NOT NULL DEFAULT 0
                CHECK (registered_count >= 0 AND registered_count <= capacity),
            registration_opens_until TIMESTAMPTZ NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            version BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        ",
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Database(format!("Failed to create events table: {e}")))?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS registrations (
            event_id UUID NOT NULL REFERENCES events(id),
            registrant_key TEXT NOT NULL,
            party_size INT NOT NULL CHECK (party_size >= 1),
            notes TEXT NOT NULL DEFAULT '',
            registered_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (event_id, registrant_key)
        )
        ",
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Database(format!("Failed to create registrations table: {e}")))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_registrations_registered_at
         ON registrations(registered_at)",
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Database(format!("Failed to create registered_at index: {e}")))?;

    tracing::info!("Schema migration complete");

    Ok(())
}

/// PostgreSQL-backed implementation of [`EventStore`].
///
/// Cheap to clone; the pool is internally reference-counted.
///
/// # Example
///
/// ```no_run
/// use guestlist_postgres::{PostgresConfig, PostgresEventStore, migrate};
///
/// # async fn example() -> Result<(), guestlist_core::store::StoreError> {
/// let store = PostgresEventStore::connect(&PostgresConfig::from_env()).await?;
/// migrate(store.pool()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Create a store using an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool according to `config` and wrap it in a store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the pool cannot be established.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout)))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to PostgreSQL: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Access the underlying connection pool.
    ///
    /// Useful for running migrations, health checks or manual queries.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a fresh event row from a snapshot's scalar fields.
    ///
    /// Fixture and admin helper; it writes the `events` row only.
    /// Registrations arrive exclusively through
    /// [`EventStore::commit_registration`], so any registrant keys carried
    /// on the snapshot are not persisted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the insert fails, including when
    /// an event with this id already exists.
    pub async fn insert_event(&self, snapshot: &EventSnapshot) -> Result<(), StoreError> {
        let capacity = i32::try_from(snapshot.capacity.value())
            .map_err(|e| StoreError::Database(format!("Capacity out of range: {e}")))?;
        let registered_count = i32::try_from(snapshot.registered_count)
            .map_err(|e| StoreError::Database(format!("Registered count out of range: {e}")))?;
        #[allow(clippy::cast_possible_wrap)] // A version needs 2^63 commits to wrap
        let version = snapshot.version.value() as i64;

        sqlx::query(
            r"
            INSERT INTO events (id, capacity, registered_count, registration_opens_until, status, version)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(snapshot.id.as_uuid())
        .bind(capacity)
        .bind(registered_count)
        .bind(snapshot.registration_opens_until)
        .bind(snapshot.status.as_str())
        .bind(version)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert event: {e}")))?;

        Ok(())
    }

    /// Convert a database row to an [`EventSnapshot`].
    fn row_to_snapshot(row: &PgRow) -> Result<EventSnapshot, StoreError> {
        let decode =
            |e: sqlx::Error| StoreError::Database(format!("Failed to decode event row: {e}"));

        let id: sqlx::types::Uuid = row.try_get("id").map_err(decode)?;
        let capacity: i32 = row.try_get("capacity").map_err(decode)?;
        let registered_count: i32 = row.try_get("registered_count").map_err(decode)?;
        let registration_opens_until: DateTime<Utc> =
            row.try_get("registration_opens_until").map_err(decode)?;
        let status: String = row.try_get("status").map_err(decode)?;
        let version: i64 = row.try_get("version").map_err(decode)?;
        let registrant_keys: Option<Vec<String>> =
            row.try_get("registrant_keys").map_err(decode)?;

        let status = status
            .parse::<EventStatus>()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        #[allow(clippy::cast_sign_loss)] // CHECK constraints keep stored values non-negative
        let snapshot = EventSnapshot {
            id: EventId::from_uuid(id),
            capacity: Capacity::new(capacity as u32),
            registered_count: registered_count as u32,
            registration_opens_until,
            status,
            registrants: registrant_keys
                .unwrap_or_default()
                .into_iter()
                .map(RegistrantKey::from)
                .collect(),
            version: Version::new(version as u64),
        };

        Ok(snapshot)
    }
}

impl EventStore for PostgresEventStore {
    fn load_event(
        &self,
        event_id: &EventId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<EventSnapshot>, StoreError>> + Send + '_>> {
        let event_id = *event_id;
        Box::pin(async move {
            let row = sqlx::query(
                r"
                SELECT e.id, e.capacity, e.registered_count, e.registration_opens_until,
                       e.status, e.version,
                       array_agg(r.registrant_key)
                           FILTER (WHERE r.registrant_key IS NOT NULL) AS registrant_keys
                FROM events e
                LEFT JOIN registrations r ON r.event_id = e.id
                WHERE e.id = $1
                GROUP BY e.id
                ",
            )
            .bind(event_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to load event: {e}")))?;

            row.map(|row| Self::row_to_snapshot(&row)).transpose()
        })
    }

    fn commit_registration(
        &self,
        event_id: &EventId,
        expected: ExpectedState,
        registration: Registration,
    ) -> Pin<Box<dyn Future<Output = Result<CommitReceipt, CommitError>> + Send + '_>> {
        let event_id = *event_id;
        Box::pin(async move {
            let party = i32::try_from(registration.party_size.value())
                .map_err(|e| StoreError::Database(format!("Party size out of range: {e}")))?;
            let expected_count = i32::try_from(expected.registered_count)
                .map_err(|e| StoreError::Database(format!("Registered count out of range: {e}")))?;
            #[allow(clippy::cast_possible_wrap)] // A version needs 2^63 commits to wrap
            let expected_version = expected.version.value() as i64;

            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| StoreError::Database(format!("Failed to begin transaction: {e}")))?;

            // The INSERT doubles as the atomic duplicate check: the composite
            // primary key makes a second registration with the same key a
            // conflict, and DO NOTHING turns that into zero rows affected.
            // A missing event surfaces here too, as a foreign key violation.
            let inserted = sqlx::query(
                r"
                INSERT INTO registrations (event_id, registrant_key, party_size, notes, registered_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (event_id, registrant_key) DO NOTHING
                ",
            )
            .bind(event_id.as_uuid())
            .bind(registration.registrant_key.as_str())
            .bind(party)
            .bind(&registration.notes)
            .bind(registration.registered_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    CommitError::EventMissing(event_id)
                }
                _ => CommitError::Store(StoreError::Database(format!(
                    "Failed to insert registration: {e}"
                ))),
            })?;

            if inserted.rows_affected() == 0 {
                // Dropping the transaction rolls everything back.
                return Err(CommitError::DuplicateRegistrant {
                    event_id,
                    registrant_key: registration.registrant_key,
                });
            }

            // The guarded UPDATE carries the whole precondition: version and
            // count must still match the snapshot the admission decision was
            // computed on, and the party must still fit under capacity.
            let updated = sqlx::query(
                r"
                UPDATE events
                SET registered_count = registered_count + $2,
                    version = version + 1
                WHERE id = $1
                  AND version = $3
                  AND registered_count = $4
                  AND registered_count + $2 <= capacity
                RETURNING version, registered_count
                ",
            )
            .bind(event_id.as_uuid())
            .bind(party)
            .bind(expected_version)
            .bind(expected_count)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to update event: {e}")))?;

            let Some(row) = updated else {
                // Zero rows: the event moved on or vanished. The probe runs
                // on a fresh statement snapshot, so it sees the interleaved
                // writer's committed version.
                let actual: Option<(i64,)> =
                    sqlx::query_as("SELECT version FROM events WHERE id = $1")
                        .bind(event_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| {
                            StoreError::Database(format!("Failed to probe event version: {e}"))
                        })?;

                return match actual {
                    None => Err(CommitError::EventMissing(event_id)),
                    Some((version,)) => {
                        #[allow(clippy::cast_sign_loss)] // Versions are non-negative in storage
                        let actual = Version::new(version as u64);
                        Err(CommitError::PreconditionFailed {
                            event_id,
                            expected: expected.version,
                            actual,
                        })
                    }
                };
            };

            let decode =
                |e: sqlx::Error| StoreError::Database(format!("Failed to decode event row: {e}"));
            let version: i64 = row.try_get("version").map_err(decode)?;
            let registered_count: i32 = row.try_get("registered_count").map_err(decode)?;

            tx.commit()
                .await
                .map_err(|e| StoreError::Database(format!("Failed to commit transaction: {e}")))?;

            #[allow(clippy::cast_sign_loss)] // CHECK constraints keep stored values non-negative
            let receipt = CommitReceipt {
                version: Version::new(version as u64),
                registered_count: registered_count as u32,
            };

            tracing::debug!(
                event_id = %event_id,
                registrant_key = %registration.registrant_key,
                version = %receipt.version,
                registered_count = receipt.registered_count,
                "Registration row committed"
            );

            Ok(receipt)
        })
    }
}
