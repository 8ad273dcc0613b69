//! Reconnection Policy
//!
//! Deterministic exponential backoff for the live feed connection. Each
//! failed connect doubles the wait before the next attempt, capped at a
//! maximum delay, until the attempt budget is exhausted. The schedule
//! carries no jitter, so every retry lands at a predictable offset.
//!
//! The policy is reset only after a connection opens successfully, so a
//! feed that flaps mid-session restarts the schedule from the beginning
//! each time it manages to get through.

use std::time::Duration;

/// Configuration for reconnection backoff.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound applied to every delay.
    pub max_delay: Duration,
    /// Growth factor applied between attempts.
    pub multiplier: f64,
    /// Maximum number of attempts before giving up (0 = retry forever).
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

/// Tracks reconnection state and computes the delay for each attempt.
///
/// With the default configuration the schedule is 1s, 2s, 4s, 8s, 16s,
/// after which [`ReconnectPolicy::next_delay`] returns `None` and the
/// caller should stop retrying.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    current_delay: Duration,
    attempt_count: u32,
}

impl ReconnectPolicy {
    /// Create a new reconnect policy with the given configuration.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        let initial = config.initial_delay;
        Self {
            config,
            current_delay: initial,
            attempt_count: 0,
        }
    }

    /// Get the delay to wait before the next reconnection attempt.
    ///
    /// Returns `None` when the attempt budget is exhausted. Each call
    /// counts as one attempt and advances the schedule.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.config.max_attempts > 0 && self.attempt_count >= self.config.max_attempts {
            return None;
        }

        self.attempt_count += 1;
        let delay = self.current_delay.min(self.config.max_delay);

        // Scale up for the next attempt.
        #[allow(clippy::cast_precision_loss)]
        #[allow(clippy::cast_possible_truncation)]
        #[allow(clippy::cast_sign_loss)]
        let next_ms = (delay.as_millis() as f64 * self.config.multiplier) as u64;
        self.current_delay = Duration::from_millis(next_ms).min(self.config.max_delay);

        Some(delay)
    }

    /// Reset the policy after a successful connection.
    pub const fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.attempt_count = 0;
    }

    /// Get the current attempt count.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Check if more attempts are allowed.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.config.max_attempts == 0 || self.attempt_count < self.config.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(ReconnectConfig::default())
    }
}
