//! Registration records and their identifying types.
//!
//! A registration is who joined an event, with how many seats and an
//! optional note. Records are append-only: once committed they are never
//! updated or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for `RegistrantKey` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid registrant key: {0}")]
pub struct ParseRegistrantKeyError(String);

/// Opaque identity of whoever registered.
///
/// One key registers at most once per event; a second attempt with an equal
/// key is answered with the already-registered outcome regardless of party
/// size or notes. Equality is exact: case-sensitive, no trimming, no
/// normalization.
///
/// # Validation
///
/// - `FromStr::from_str()`: Validates input (rejects empty strings)
/// - `From::from()` and `new()`: No validation (for internal use with trusted input)
///
/// # Examples
///
/// ```
/// use guestlist_core::registration::RegistrantKey;
///
/// let key = RegistrantKey::new("alice");
/// assert_eq!(key.as_str(), "alice");
///
/// let parsed: RegistrantKey = "bob".parse().unwrap();
/// assert_eq!(parsed, RegistrantKey::new("bob"));
/// assert!("".parse::<RegistrantKey>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrantKey(String);

impl RegistrantKey {
    /// Create a new `RegistrantKey` from a string.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the `RegistrantKey` into its inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RegistrantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RegistrantKey {
    type Err = ParseRegistrantKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseRegistrantKeyError(
                "Registrant key cannot be empty".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for RegistrantKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RegistrantKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for RegistrantKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Number of seats one registration consumes.
///
/// The type carries whatever it is given; the engine rejects values below 1
/// before any admission rule runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartySize(pub u32);

impl PartySize {
    /// Creates a new `PartySize`
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the party size value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Whether this party size is usable (at least one seat).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 >= 1
    }
}

impl fmt::Display for PartySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed registration.
///
/// `registered_at` is assigned by the engine from its clock at commit time;
/// callers never supply it. `notes` is carried verbatim and may be empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Who registered
    pub registrant_key: RegistrantKey,
    /// Seats this registration consumes
    pub party_size: PartySize,
    /// Free-text note, carried verbatim
    pub notes: String,
    /// When the engine committed this registration
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    /// Creates a new `Registration`
    #[must_use]
    pub fn new(
        registrant_key: RegistrantKey,
        party_size: PartySize,
        notes: impl Into<String>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            registrant_key,
            party_size,
            notes: notes.into(),
            registered_at,
        }
    }
}
