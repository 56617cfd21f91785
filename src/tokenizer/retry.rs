//! Bounded retries for tokenizer calls.
use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    pub max_attempts: usize,
    /// Wait between two attempts, in milliseconds.
    pub delay_ms: u64,
    /// Double the wait after every failed attempt.
    pub exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1_000,
            exponential: false,
        }
    }
}

impl RetryPolicy {
    /// Wait before attempt `attempt + 1`, `attempt` being the 1-based number of the attempt that failed.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let factor = if self.exponential {
            let shift = attempt.saturating_sub(1).min(32) as u32;
            1u64 << shift
        } else {
            1
        };
        Duration::from_millis(self.delay_ms.saturating_mul(factor))
    }

    /// Run `op` until it succeeds or `max_attempts` attempts failed.
    /// The error of the last attempt is returned.
    /// Errors that are not [retryable](Error::is_retryable) are returned right away.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if !e.is_retryable() => {
                    debug!("{}: not retrying: {}", what, e);
                    return Err(e);
                }
                Err(e) if attempt >= self.max_attempts => {
                    debug!("{}: giving up after {} attempts", what, attempt);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        "{}: attempt {}/{} failed: {}. retrying in {:?}",
                        what, attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
