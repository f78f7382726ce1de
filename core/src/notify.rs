//! Notification abstraction for confirmation messages.
//!
//! After a registration commits, the engine hands a [`Notice`] to a
//! [`NotificationDispatcher`] on a spawned task and moves on. Delivery is
//! strictly fire-and-forget: a slow or failing dispatcher is logged and
//! never changes the outcome the caller already received. What a dispatcher
//! does with a notice (push message, email, nothing) is its own business and
//! out of scope here.

use crate::event::{Capacity, EventId};
use crate::registration::{PartySize, RegistrantKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Error from a notification dispatch attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Notification dispatch failed: {0}")]
pub struct NotifyError(pub String);

/// A message worth telling someone about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// A registration committed.
    RegistrationConfirmed {
        /// Event registered for
        event_id: EventId,
        /// Who registered
        registrant_key: RegistrantKey,
        /// Seats committed
        party_size: PartySize,
        /// When the commit happened
        registered_at: DateTime<Utc>,
    },

    /// A new event opened for registration.
    ///
    /// Emitted by whatever creates events; the registration engine itself
    /// only ever emits [`Notice::RegistrationConfirmed`].
    EventCreated {
        /// The new event
        event_id: EventId,
        /// Its seat budget
        capacity: Capacity,
        /// Last instant registration is allowed
        registration_opens_until: DateTime<Utc>,
    },
}

/// Trait for notification dispatch implementations.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine dispatches from
/// spawned tasks.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of
/// `async fn` to enable trait object usage (`Arc<dyn NotificationDispatcher>`).
pub trait NotificationDispatcher: Send + Sync {
    /// Dispatch one notice.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails. The engine logs the
    /// failure and drops it; it never reaches the registration caller.
    fn dispatch(
        &self,
        notice: Notice,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>>;
}

/// Dispatcher that drops every notice.
///
/// The default wiring for callers that have no delivery channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl NotificationDispatcher for NoopDispatcher {
    fn dispatch(
        &self,
        _notice: Notice,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}
