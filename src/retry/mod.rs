//! Retry decisions and the async driver that applies them.
//!
//! Queries and mutations share one driver, [`retry`], but carry different
//! [`RetryPolicy`] values:
//!
//! | Policy                     | Retries | Delay                      | 404 retried |
//! |----------------------------|---------|----------------------------|-------------|
//! | [`RetryPolicy::queries`]   | 2       | `min(1s * 2^attempt, 30s)` | no          |
//! | [`RetryPolicy::mutations`] | 1       | fixed 1s                   | yes         |
//!
//! `attempt` is the zero-based index of the retry about to be made, so a query
//! that keeps failing waits 1s, then 2s, then gives up after three calls.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FetchError;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `min(base * 2^attempt, cap)`.
    Exponential { base: Duration, cap: Duration },
    Fixed(Duration),
}

impl Backoff {
    /// Delay before retry number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Exponential { base, cap } => {
                let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(cap)
            }
            Self::Fixed(delay) => delay,
        }
    }
}

/// How many times, and how patiently, a failed call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
    /// When `false`, a "not found" failure is returned immediately.
    pub retry_not_found: bool,
}

impl RetryPolicy {
    pub const fn queries() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(1000),
                cap: Duration::from_millis(30_000),
            },
            retry_not_found: false,
        }
    }

    /// Mutations can have side effects, so they get a single retry.
    pub const fn mutations() -> Self {
        Self {
            max_retries: 1,
            backoff: Backoff::Fixed(Duration::from_millis(1000)),
            retry_not_found: true,
        }
    }

    pub const fn never() -> Self {
        Self {
            max_retries: 0,
            backoff: Backoff::Fixed(Duration::ZERO),
            retry_not_found: false,
        }
    }

    /// Decides whether retry number `attempt` (zero-based) should run after `error`.
    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
        if matches!(error, FetchError::Cancelled) {
            return false;
        }
        if error.is_not_found() && !self.retry_not_found {
            return false;
        }
        attempt < self.max_retries
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::queries()
    }
}

/// The default query retry decision: skip on "not found", otherwise allow two retries.
pub fn should_retry(error: &FetchError, attempt: u32) -> bool {
    RetryPolicy::queries().should_retry(error, attempt)
}

/// Runs `op` until it succeeds or `policy` says to stop, sleeping between attempts.
///
/// `label` only appears in log records.
///
/// # Errors
///
/// Returns the error from the last attempt.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if policy.should_retry(&e, attempt) => {
                let delay = policy.delay(attempt);
                debug!(target_key = label, attempt, ?delay, error = %e, "retrying after failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(target_key = label, attempts = attempt + 1, error = %e, "giving up");
                return Err(e);
            }
        }
    }
}
