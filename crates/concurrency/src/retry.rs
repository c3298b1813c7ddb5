//! Retry policy for conditional commits
//!
//! A `VersionConflict` only means another append landed first, so the
//! coordinator retries with a fresh version. Backoff is exponential with
//! full jitter and capped, so contending writers spread out instead of
//! colliding again on the next attempt.

use rand::Rng;
use std::time::Duration;

/// Configuration for retry behavior with exponential backoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total commit attempts before giving up (default: 5)
    pub max_attempts: u32,
    /// Backoff ceiling after the first conflict (default: 1ms)
    pub backoff_base: Duration,
    /// Backoff ceiling for any single wait (default: 20ms)
    pub backoff_max: Duration,
    /// Caller deadline for the whole operation (default: none)
    pub timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(1),
            backoff_max: Duration::from_millis(20),
            timeout: None,
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` attempts and default backoff
    #[must_use]
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Set the caller deadline
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Upper bound of the wait after the `conflicts`-th conflict
    ///
    /// `backoff_base * 2^(conflicts - 1)`, capped at `backoff_max`.
    pub fn backoff_ceiling(&self, conflicts: u32) -> Duration {
        let shift = conflicts.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(1u32 << shift)
            .min(self.backoff_max)
    }

    /// Jittered wait after the `conflicts`-th conflict, in `[0, ceiling]`
    pub fn backoff(&self, conflicts: u32) -> Duration {
        let ceiling = self.backoff_ceiling(conflicts).as_micros() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::thread_rng().gen_range(0..=ceiling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.timeout, None);
    }

    #[test]
    fn test_with_attempts_never_zero() {
        assert_eq!(RetryPolicy::with_attempts(0).max_attempts, 1);
        assert_eq!(RetryPolicy::with_attempts(8).max_attempts, 8);
    }

    #[test]
    fn test_backoff_ceiling_doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_ceiling(1), Duration::from_millis(1));
        assert_eq!(policy.backoff_ceiling(2), Duration::from_millis(2));
        assert_eq!(policy.backoff_ceiling(3), Duration::from_millis(4));
        assert_eq!(policy.backoff_ceiling(6), Duration::from_millis(20));
        assert_eq!(policy.backoff_ceiling(100), Duration::from_millis(20));
    }

    #[test]
    fn test_backoff_within_ceiling() {
        let policy = RetryPolicy::default();
        for conflicts in 1..10 {
            assert!(policy.backoff(conflicts) <= policy.backoff_ceiling(conflicts));
        }
    }

    #[test]
    fn test_zero_backoff() {
        let policy = RetryPolicy {
            backoff_base: Duration::ZERO,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(3), Duration::ZERO);
    }
}
