//! Engine configuration.
//!
//! Loaded from environment variables with sensible defaults.

use std::env;

/// Environment variable overriding the commit attempt cap.
pub const MAX_COMMIT_ATTEMPTS_VAR: &str = "GUESTLIST_MAX_COMMIT_ATTEMPTS";

const DEFAULT_MAX_COMMIT_ATTEMPTS: usize = 4;

/// Tuning knobs for the registration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How many conditional commits one registration may attempt before the
    /// engine reports contention.
    ///
    /// Each attempt starts from a fresh read. No delay is inserted between
    /// attempts: a lost race means the competing write has already landed,
    /// so an immediate re-read observes the new state.
    pub max_commit_attempts: usize,
}

impl EngineConfig {
    /// Create a configuration with a specific attempt cap.
    #[must_use]
    pub const fn new(max_commit_attempts: usize) -> Self {
        Self {
            max_commit_attempts,
        }
    }

    /// Set the commit attempt cap.
    #[must_use]
    pub const fn with_max_commit_attempts(mut self, attempts: usize) -> Self {
        self.max_commit_attempts = attempts;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `GUESTLIST_MAX_COMMIT_ATTEMPTS`; absent or unparsable values
    /// fall back quietly to the default of 4.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_commit_attempts: env::var(MAX_COMMIT_ATTEMPTS_VAR)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_COMMIT_ATTEMPTS),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COMMIT_ATTEMPTS)
    }
}
