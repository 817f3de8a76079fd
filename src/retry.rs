//! Retry with backoff for backend and vendor calls

use std::future::Future;
use std::time::{Duration, SystemTime};

use crate::{Error, Result};

/// How the delay grows between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base_delay * 2^attempt` plus up to 25% jitter
    Exponential,
    /// `base_delay * (attempt + 1)`, no jitter
    Linear,
}

/// Retry policy for failed requests
///
/// Controls how many times an operation is attempted and how long to
/// wait between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay between attempts
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
    /// Delay growth strategy
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Policy used for the avatar WebSocket: 3 attempts, waiting 2s then 4s
    #[must_use]
    pub const fn avatar() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff: Backoff::Linear,
        }
    }

    /// Policy that never retries
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff: Backoff::Linear,
        }
    }
}

/// Determine whether an HTTP status and response body indicate a recoverable error.
///
/// Recoverable errors are worth retrying: rate limits (429), server errors (5xx),
/// and certain transient network-level failures surfaced in the body text.
#[must_use]
pub fn is_recoverable(status: u16, body: &str) -> bool {
    if status == 429 {
        return true;
    }

    if (500..600).contains(&status) {
        return true;
    }

    let lower = body.to_lowercase();
    lower.contains("connection reset")
        || lower.contains("timed out")
        || lower.contains("dns error")
}

/// Compute the delay after the given zero-based failed attempt.
///
/// Jitter for exponential backoff is 0-25% of the computed delay, derived
/// from `SystemTime` to avoid pulling in a random number generator.
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    match policy.backoff {
        Backoff::Linear => policy
            .base_delay
            .saturating_mul(attempt.saturating_add(1))
            .min(policy.max_delay),
        Backoff::Exponential => {
            let base = policy
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt))
                .min(policy.max_delay);

            let jitter_nanos = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos();

            let jitter_fraction = f64::from(jitter_nanos % 250) / 1000.0;
            let jitter = base.mul_f64(jitter_fraction);

            (base + jitter).min(policy.max_delay)
        }
    }
}

/// Run `op` until it succeeds, the policy is exhausted, or `should_retry`
/// rejects the error. The last error is returned unchanged.
///
/// # Errors
///
/// Returns the error of the final attempt
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    should_retry: impl Fn(&Error) -> bool,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= policy.max_attempts.max(1) || !should_retry(&e) {
                    return Err(e);
                }

                let delay = delay_for_attempt(policy, attempt - 1);
                tracing::warn!(
                    what,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
