//! Global pacing between metadata API calls.
//!
//! The API is paced as a whole, not per endpoint: after every successful call
//! the next call waits until `delay` has elapsed since that success. Failed
//! attempts do not move the clock; their spacing comes from the retry backoff.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Inter-call delay enforcer shared by all requests of one client.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    last_success: Mutex<Option<Instant>>,
}

impl Pacer {
    /// Creates a pacer that spaces successful calls by `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_success: Mutex::new(None),
        }
    }

    /// Creates a pacer that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// True when no pacing is applied.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.delay.is_zero()
    }

    /// Waits until the delay since the last successful call has passed.
    ///
    /// The lock is held while sleeping so concurrent callers queue up behind
    /// each other instead of all waking at once.
    pub async fn wait_turn(&self) {
        if self.is_disabled() {
            return;
        }
        let guard = self.last_success.lock().await;
        if let Some(last) = *guard {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                let remaining = self.delay.saturating_sub(elapsed);
                debug!(delay_ms = remaining.as_millis(), "pacing API request");
                tokio::time::sleep(remaining).await;
            }
        }
    }

    /// Restarts the pacing clock after a successful call.
    pub async fn mark_success(&self) {
        if self.is_disabled() {
            return;
        }
        *self.last_success.lock().await = Some(Instant::now());
    }
}
