//! # Retry policy for failed request attempts.
//!
//! [`RetryPolicy`] controls how many attempts a request gets, which HTTP
//! statuses are retryable, and how retry delays grow. The delay for attempt
//! `n` (1-based) is `base_delay × 2^(n−1)`, clamped to `max_delay`, then
//! jittered within `±delay·jitter`. The base delay is derived purely from
//! the attempt number, so jitter output never feeds back into subsequent
//! calculations.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use markwire::RetryPolicy;
//!
//! let policy = RetryPolicy {
//!     max_attempts: 4,
//!     retry_on: vec![502, 503],
//!     base_delay: Duration::from_millis(100),
//!     max_delay: Duration::from_secs(1),
//!     jitter: 0.0,
//! };
//!
//! assert_eq!(policy.delay_for(1), Duration::from_millis(100));
//! assert_eq!(policy.delay_for(2), Duration::from_millis(200));
//! // 100ms × 2^9 = 51_200ms → capped at max=1s
//! assert_eq!(policy.delay_for(10), Duration::from_secs(1));
//! ```

use std::time::Duration;

use rand::Rng;

/// Retry policy for one request execution.
///
/// Invariants (enforced by [`RetryPolicy::normalized`]):
/// - `max_attempts >= 1`;
/// - the computed delay never exceeds `max_delay`;
/// - `jitter` is clamped to `[0.0, 1.0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempt cap, including the first attempt.
    pub max_attempts: u32,
    /// HTTP statuses that warrant a retry.
    pub retry_on: Vec<u16>,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Maximum delay cap for retries.
    pub max_delay: Duration,
    /// Jitter fraction: each delay is randomized within `±delay·jitter`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    /// Returns the policy used when retry is enabled without further spec:
    /// 3 attempts, retry on 429/502/503/504, 200ms base, 5s cap, 10% jitter.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_on: vec![429, 502, 503, 504],
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// The policy for disabled retries: a single attempt, nothing retryable.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            retry_on: Vec::new(),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// Returns a copy with the invariants enforced.
    pub fn normalized(mut self) -> Self {
        self.max_attempts = self.max_attempts.max(1);
        self.jitter = self.jitter.clamp(0.0, 1.0);
        if self.max_delay < self.base_delay {
            self.max_delay = self.base_delay;
        }
        self
    }

    /// True when the given response status is in the retryable set.
    #[inline]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_on.contains(&status)
    }

    /// Computes the delay before the attempt following `attempt` (1-based).
    ///
    /// The base is `base_delay × 2^(attempt−1)` clamped to `max_delay`;
    /// jitter is applied to the clamped base and the result is clamped again
    /// so it never exceeds `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let max_secs = self.max_delay.as_secs_f64();
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let unclamped = self.base_delay.as_secs_f64() * 2f64.powi(exp);

        let base = if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max_delay
        } else {
            Duration::from_secs_f64(unclamped)
        };

        if self.jitter <= 0.0 {
            return base;
        }

        let spread = base.as_secs_f64() * self.jitter;
        if spread <= 0.0 {
            return base;
        }
        let mut rng = rand::rng();
        let offset = rng.random_range(-spread..=spread);
        let jittered = (base.as_secs_f64() + offset).max(0.0);
        Duration::from_secs_f64(jittered).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(jitter: f64) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            retry_on: vec![503],
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            jitter,
        }
    }

    #[test]
    fn test_exponential_growth_no_jitter() {
        let p = policy(0.0);
        assert_eq!(p.delay_for(1), Duration::from_millis(100));
        assert_eq!(p.delay_for(2), Duration::from_millis(200));
        assert_eq!(p.delay_for(3), Duration::from_millis(400));
        assert_eq!(p.delay_for(4), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_is_non_decreasing_up_to_max() {
        let p = policy(0.0);
        let mut prev = Duration::ZERO;
        for attempt in 1..40 {
            let d = p.delay_for(attempt);
            assert!(d >= prev, "attempt {attempt}: {d:?} < {prev:?}");
            assert!(d <= p.max_delay);
            prev = d;
        }
    }

    #[test]
    fn test_clamped_to_max() {
        let p = RetryPolicy {
            max_delay: Duration::from_secs(1),
            ..policy(0.0)
        };
        assert_eq!(p.delay_for(10), Duration::from_secs(1));
        assert_eq!(p.delay_for(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let p = policy(0.5);
        for attempt in 1..10 {
            let base = p.delay_for(attempt).as_secs_f64();
            let exact = (0.1 * 2f64.powi(attempt as i32 - 1)).min(30.0);
            assert!(base <= exact * 1.5 + 1e-9, "attempt {attempt}: {base}");
            assert!(base >= exact * 0.5 - 1e-9, "attempt {attempt}: {base}");
        }
    }

    #[test]
    fn test_jitter_never_exceeds_max_delay() {
        let p = RetryPolicy {
            max_delay: Duration::from_millis(150),
            ..policy(1.0)
        };
        for _ in 0..100 {
            assert!(p.delay_for(8) <= Duration::from_millis(150));
        }
    }

    #[test]
    fn test_normalized_enforces_invariants() {
        let p = RetryPolicy {
            max_attempts: 0,
            retry_on: vec![],
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(1),
            jitter: 7.0,
        }
        .normalized();
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.jitter, 1.0);
        assert_eq!(p.max_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_retryable_status_set() {
        let p = policy(0.0);
        assert!(p.is_retryable_status(503));
        assert!(!p.is_retryable_status(500));
        assert!(!RetryPolicy::disabled().is_retryable_status(503));
    }
}
