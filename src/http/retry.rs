//! Retry and backoff decisions
//!
//! The controller never sleeps or sends anything itself. The request engine
//! reports each failed attempt and acts on the returned [`RetryDecision`].

use crate::error::{is_retryable_status, FailureKind};
use std::fmt;
use std::time::Duration;

/// Default number of attempts, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry budget and backoff curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed per call
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `base * 2^n`
    pub backoff_base: Duration,
    /// Upper bound on a single delay
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(10),
        }
    }
}

/// Why an attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFailure {
    /// No response within the per-attempt timeout
    Timeout,
    /// Could not reach the device
    Connection,
    /// HTTP 401 on an authenticated call
    Unauthorized,
    /// Any other non-2xx status
    Status(u16),
}

impl AttemptFailure {
    /// Classify a non-2xx HTTP status
    pub fn from_status(status: u16) -> Self {
        if status == 401 {
            AttemptFailure::Unauthorized
        } else {
            AttemptFailure::Status(status)
        }
    }

    /// Failure kind reported when this is the last failure of a call
    pub fn kind(self) -> FailureKind {
        match self {
            AttemptFailure::Timeout | AttemptFailure::Connection => FailureKind::Transport,
            AttemptFailure::Unauthorized => FailureKind::TokenExpired,
            AttemptFailure::Status(429) => FailureKind::RateLimit,
            AttemptFailure::Status(_) => FailureKind::Api,
        }
    }

    /// HTTP status behind the failure, if there was a response
    pub fn status(self) -> Option<u16> {
        match self {
            AttemptFailure::Unauthorized => Some(401),
            AttemptFailure::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(self) -> bool {
        match self {
            AttemptFailure::Timeout | AttemptFailure::Connection | AttemptFailure::Unauthorized => {
                true
            }
            AttemptFailure::Status(status) => is_retryable_status(status),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Timeout => f.write_str("request timed out"),
            AttemptFailure::Connection => f.write_str("connection failed"),
            AttemptFailure::Unauthorized => f.write_str("HTTP 401"),
            AttemptFailure::Status(status) => write!(f, "HTTP {status}"),
        }
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep, then resend
    RetryAfter(Duration),
    /// Log in again, then resend immediately
    Reauthenticate,
    /// Not retryable; surface the failure as is
    GiveUp,
    /// Retryable, but the attempt budget is spent
    Exhausted,
}

impl RetryPolicy {
    /// Create a policy with the default backoff curve
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Set the backoff curve
    #[must_use]
    pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_cap = cap;
        self
    }

    /// Delay after the 1-based attempt `attempt`: `min(base * 2^attempt, cap)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(self.backoff_base.saturating_mul(factor), self.backoff_cap)
    }

    /// Decide how to continue after the 1-based attempt `attempt` failed
    pub fn decide(&self, attempt: u32, failure: AttemptFailure) -> RetryDecision {
        if !failure.is_retryable() {
            return RetryDecision::GiveUp;
        }
        if attempt >= self.max_attempts {
            return RetryDecision::Exhausted;
        }
        match failure {
            AttemptFailure::Unauthorized => RetryDecision::Reauthenticate,
            _ => RetryDecision::RetryAfter(self.backoff_delay(attempt)),
        }
    }
}

#[cfg(test)]
mod retry_tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff_base, Duration::from_secs(1));
        assert_eq!(policy.backoff_cap, Duration::from_secs(10));
    }

    #[test_case(1, 2 ; "first retry")]
    #[test_case(2, 4 ; "second retry")]
    #[test_case(3, 8 ; "third retry")]
    #[test_case(4, 10 ; "capped")]
    #[test_case(40, 10 ; "huge attempt stays capped")]
    fn test_backoff_delay(attempt: u32, secs: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(attempt), Duration::from_secs(secs));
    }

    #[test]
    fn test_transport_failures_back_off() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, AttemptFailure::Timeout),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(
            policy.decide(2, AttemptFailure::Connection),
            RetryDecision::RetryAfter(Duration::from_secs(4))
        );
        assert_eq!(
            policy.decide(3, AttemptFailure::Timeout),
            RetryDecision::Exhausted
        );
    }

    #[test_case(408)]
    #[test_case(429)]
    #[test_case(500)]
    #[test_case(502)]
    #[test_case(503)]
    #[test_case(504)]
    fn test_retryable_statuses(status: u16) {
        let policy = RetryPolicy::default();
        assert!(matches!(
            policy.decide(1, AttemptFailure::from_status(status)),
            RetryDecision::RetryAfter(_)
        ));
    }

    #[test_case(400)]
    #[test_case(403)]
    #[test_case(404)]
    #[test_case(501)]
    fn test_fatal_statuses(status: u16) {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, AttemptFailure::from_status(status)),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn test_unauthorized_reauthenticates_while_attempts_remain() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, AttemptFailure::from_status(401)),
            RetryDecision::Reauthenticate
        );
        assert_eq!(
            policy.decide(3, AttemptFailure::Unauthorized),
            RetryDecision::Exhausted
        );
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(AttemptFailure::Timeout.kind(), FailureKind::Transport);
        assert_eq!(AttemptFailure::Status(429).kind(), FailureKind::RateLimit);
        assert_eq!(AttemptFailure::Status(503).kind(), FailureKind::Api);
        assert_eq!(AttemptFailure::Unauthorized.status(), Some(401));
        assert_eq!(AttemptFailure::Connection.status(), None);
    }
}
