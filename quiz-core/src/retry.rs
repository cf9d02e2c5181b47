//! Retry logic with exponential backoff

use crate::config::QuizConfig;
use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Wait before attempt `n + 1` is `backoff_unit * 2^n`
    pub backoff_unit: Duration,
    /// Upper bound of a single wait, `None` for unbounded growth
    pub max_backoff: Option<Duration>,
    /// Add up to 25% random extra wait
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
            max_backoff: Some(Duration::from_secs(60)),
            jitter: false,
        }
    }
}

impl From<&QuizConfig> for RetryPolicy {
    fn from(config: &QuizConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_unit: config.backoff_unit(),
            max_backoff: config.max_backoff(),
            jitter: config.retry_jitter,
        }
    }
}

impl RetryPolicy {
    /// Wait after `attempts_made` failed attempts
    pub fn backoff_for(&self, attempts_made: u32) -> Duration {
        let backoff = 2u32
            .checked_pow(attempts_made)
            .and_then(|factor| self.backoff_unit.checked_mul(factor))
            .unwrap_or(Duration::MAX);

        match self.max_backoff {
            Some(cap) => backoff.min(cap),
            None => backoff,
        }
    }

    /// Execute operation with retry logic
    ///
    /// The operation receives the 1-based attempt number. Errors that are not
    /// retryable end the loop at once and are returned unchanged; running out of
    /// attempts yields [`Error::Exhausted`] wrapping the last failure.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation(attempt).await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(result);
                }
                Err(e) if !e.is_retryable() => {
                    warn!("Operation failed with non-retryable error: {}", e);
                    return Err(e);
                }
                Err(e) if attempt < self.max_attempts => {
                    let mut backoff = self.backoff_for(attempt);
                    if self.jitter {
                        backoff = self.add_jitter(backoff);
                    }

                    warn!(
                        "Operation failed (attempt {}/{}): {}. Retrying after {:?}",
                        attempt, self.max_attempts, e, backoff
                    );

                    sleep(backoff).await;
                }
                Err(e) => {
                    warn!("Operation failed after {} attempts: {}", attempt, e);
                    return Err(Error::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
            }
        }
    }

    fn add_jitter(&self, duration: Duration) -> Duration {
        use rand::Rng;
        let jitter_ms = rand::thread_rng().gen_range(0..=duration.as_millis() / 4);
        let jittered = duration.saturating_add(Duration::from_millis(jitter_ms as u64));
        match self.max_backoff {
            Some(cap) => jittered.min(cap),
            None => jittered,
        }
    }
}
