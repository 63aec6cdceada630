//! Retry logic with exponential backoff for metadata API calls.
//!
//! Attempts are numbered from 0. After a failed attempt `n` that is not the
//! last one, the caller sleeps `base_delay * multiplier^n`; with defaults that
//! is 1s after the first failure and 2s after the second. There is no sleep
//! after the final attempt.
//!
//! ```
//! use std::time::Duration;
//! use mirror_core::api::{FailureType, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(
//!     policy.should_retry(FailureType::Transient, 0),
//!     RetryDecision::Retry { delay: Duration::from_secs(1), attempt: 1 }
//! );
//! assert!(matches!(
//!     policy.should_retry(FailureType::Transient, 2),
//!     RetryDecision::DoNotRetry { .. }
//! ));
//! ```

use std::time::Duration;

use tracing::debug;

use super::ApiError;

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay (1 second).
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay cap (32 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Classification of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// May succeed on another attempt: network errors, timeouts, any non-2xx.
    Transient,
    /// Will not improve with retries: undecodable bodies, invalid URLs.
    Permanent,
}

/// Decision on whether to retry a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make attempt number `attempt` (0-indexed).
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Index of the next attempt.
        attempt: u32,
    },

    /// Give up.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Retry configuration with exponential backoff.
///
/// `delay = min(base_delay * multiplier^attempt, max_delay)`
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Creates a policy with a custom attempt count and default delays.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Maximum number of attempts, including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what to do after attempt `attempt` (0-indexed) failed.
    #[must_use]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt.saturating_add(1) >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.delay_for(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Backoff delay after failed attempt `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.powi(exponent);
        let scaled_secs = self.base_delay.as_secs_f64() * factor;
        if !scaled_secs.is_finite() || scaled_secs < 0.0 || scaled_secs >= self.max_delay.as_secs_f64()
        {
            return self.max_delay;
        }
        Duration::from_secs_f64(scaled_secs)
    }
}

/// Classifies an API error for retry purposes.
#[must_use]
pub fn classify_error(error: &ApiError) -> FailureType {
    match error {
        ApiError::Network { .. } | ApiError::Timeout { .. } | ApiError::HttpStatus { .. } => {
            FailureType::Transient
        }
        ApiError::Decode { .. }
        | ApiError::InvalidUrl { .. }
        | ApiError::ClientBuild { .. }
        | ApiError::Exhausted { .. } => FailureType::Permanent,
    }
}
