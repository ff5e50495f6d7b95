//! Bounded Retry
//!
//! Fixed number of attempts with a constant delay in between. The last
//! attempt's outcome is returned as is.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::clock::Sleeper;

/// Attempts used for LP status endpoints
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay between status attempts
pub const DEFAULT_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first, at least 1
    pub max_attempts: u32,
    /// Constant delay between two attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no delay
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// The sleeper is only invoked between attempts, never after the last one.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, sleeper: &dyn Sleeper, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                debug!(
                    target: "flyover::retry",
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "attempt failed, retrying"
                );
                sleeper.sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
