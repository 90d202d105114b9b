//! Rate limiting implementation
//!
//! Uses the governor crate with a burst of one cell, which gives a strict
//! minimum spacing of `1 / requests_per_second` between requests. A limiter
//! that has been idle for at least one interval lets the next request through
//! without delay.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use crate::error::{Error, Result};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::time::Duration;

/// Default maximum request rate
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;

/// Configuration for rate limiting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second (fractional rates allowed)
    pub requests_per_second: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            requests_per_second,
        }
    }

    /// Minimum spacing between two requests
    ///
    /// `None` when the rate is not positive and finite, or when its spacing
    /// rounds to zero or does not fit in 64-bit nanoseconds.
    pub fn min_interval(&self) -> Option<Duration> {
        if !self.requests_per_second.is_finite() || self.requests_per_second <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(1.0 / self.requests_per_second)
            .ok()
            .filter(|d| !d.is_zero() && u64::try_from(d.as_nanos()).is_ok())
    }
}

/// Per-engine request spacer
pub struct RateLimiter {
    limiter: Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
    min_interval: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Result<Self> {
        let unusable = || {
            Error::validation(
                "rate_limit",
                format!(
                    "rate limit {} gives no usable request spacing",
                    config.requests_per_second
                ),
            )
        };
        let min_interval = config.min_interval().ok_or_else(unusable)?;
        let quota = Quota::with_period(min_interval)
            .ok_or_else(unusable)?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            limiter: Governor::direct(quota),
            min_interval,
        })
    }

    /// Wait until the next request may be sent
    ///
    /// Returns immediately on the first call and whenever at least one
    /// interval has passed since the previous request.
    pub async fn wait_if_needed(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to take the slot for a request without waiting
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Configured spacing between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("min_interval", &self.min_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use crate::error::FailureKind;
    use std::time::Instant;
    use test_case::test_case;

    #[test]
    fn test_rate_limiter_config_default() {
        let config = RateLimiterConfig::default();
        assert!((config.requests_per_second - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.min_interval(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_min_interval_fractional_rate() {
        let config = RateLimiterConfig::new(0.5);
        assert_eq!(config.min_interval(), Some(Duration::from_secs(2)));
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(-3.0 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(f64::INFINITY ; "infinite")]
    #[test_case(1e10 ; "spacing rounds to zero")]
    #[test_case(1e-300 ; "spacing overflows duration")]
    #[test_case(1e-12 ; "spacing overflows nanoseconds")]
    fn test_unusable_rate_is_rejected(rate: f64) {
        let config = RateLimiterConfig::new(rate);
        assert_eq!(config.min_interval(), None);

        let err = RateLimiter::new(&config).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[test]
    fn test_extreme_but_usable_rates_keep_their_spacing() {
        let fast = RateLimiter::new(&RateLimiterConfig::new(1e6)).unwrap();
        assert!(!fast.min_interval().is_zero());
        assert!(fast.min_interval() <= Duration::from_micros(1));

        let slow = RateLimiter::new(&RateLimiterConfig::new(1e-3)).unwrap();
        assert!(slow.min_interval() > Duration::from_secs(999));
        assert!(slow.min_interval() < Duration::from_secs(1001));
    }

    #[tokio::test]
    async fn test_first_request_is_not_delayed() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(0.5)).unwrap();
        let start = Instant::now();
        limiter.wait_if_needed().await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_second_request_needs_a_slot() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(1.0)).unwrap();
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_requests_are_spaced() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(20.0)).unwrap();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait_if_needed().await;
        }
        // (3 - 1) / 20 s, minus a little slack for clock granularity
        assert!(start.elapsed() >= Duration::from_millis(95));
    }
}
