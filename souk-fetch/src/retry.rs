//! Retry policy for read requests.

use std::future::Future;
use std::time::Duration;

use souk_core::{ApiError, ApiResult};
use tracing::{debug, warn};

/// Default number of additional attempts after the first.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default delay used once the backoff schedule is exhausted.
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(800);

/// Policy for retrying failed reads.
///
/// Only transient failures ([`ApiError::Timeout`] and
/// [`ApiError::NetworkError`]) are retried. The delay before retry `k`
/// (1-based) is `backoff[k - 1]`, or `fallback_delay` once the schedule runs
/// out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    /// Ordered backoff schedule.
    pub backoff: Vec<Duration>,
    /// Delay for any retry beyond the schedule.
    pub fallback_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the default schedule.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: vec![Duration::from_millis(400), Duration::from_millis(800)],
            fallback_delay: DEFAULT_FALLBACK_DELAY,
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            backoff: Vec::new(),
            fallback_delay: Duration::ZERO,
        }
    }

    /// Replaces the backoff schedule.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the delay used after the schedule runs out.
    #[must_use]
    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    /// Total number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns the delay before retry `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        attempt
            .checked_sub(1)
            .and_then(|index| self.backoff.get(index as usize))
            .copied()
            .unwrap_or(self.fallback_delay)
    }

    /// Determines if a classified error should be retried.
    pub fn should_retry(&self, error: &ApiError) -> bool {
        error.is_transient()
    }

    /// Runs `operation` under this policy.
    ///
    /// The closure receives the zero-based attempt number. The wait happens
    /// before re-issuing. When attempts run out, the last error is returned.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> ApiResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_retries && self.should_retry(&err) => {
                    attempt += 1;
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        error = %err,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    debug!(error = %err, attempts = attempt + 1, "Giving up");
                    return Err(err);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}
