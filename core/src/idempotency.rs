//! Duplicate-registrant detection.
//!
//! A registrant key registers at most once per event. The engine consults
//! [`already_registered`] before the gate so duplicates fail fast without
//! touching state; the store re-checks the same condition inside the atomic
//! commit, which closes the window where a duplicate lands between the
//! engine's read and its commit.

use crate::event::EventSnapshot;
use crate::registration::RegistrantKey;

/// Whether a committed registration with an equal key exists on the snapshot.
///
/// Equality is exact key equality: case-sensitive, no trimming, no
/// normalization. Party size and notes play no part.
#[must_use]
pub fn already_registered(event: &EventSnapshot, key: &RegistrantKey) -> bool {
    event.registrants.contains(key)
}
