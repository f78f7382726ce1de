//! Injected dependencies: the clock.
//!
//! All time the engine observes flows through [`Clock`], so tests can pin
//! the instant and exercise deadline boundaries deterministically. The gate
//! itself never reads a clock; it receives the instant as an argument.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use guestlist_core::environment::{Clock, SystemClock};
///
/// fn timestamp(clock: &dyn Clock) -> String {
///     clock.now().to_rfc3339()
/// }
///
/// let _ = timestamp(&SystemClock);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
