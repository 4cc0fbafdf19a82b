//! Retry policy for downstream service calls.
//!
//! Embedding, retrieval and image-generation services are flaky under load,
//! so every call goes through a bounded attempt loop. Exhaustion is a typed
//! error that keeps the last failure around for the tool result.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use aiagent_config::ServicesConfig;
use tracing::{debug, warn};

/// How many times to try a call and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::ZERO,
        }
    }
}

/// Every attempt failed.
#[derive(Debug, thiserror::Error)]
#[error("failed after {attempts} attempts: {last_error}")]
pub struct RetryError<E: fmt::Debug + fmt::Display> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    pub fn from_config(config: &ServicesConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Debug + fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(service = label, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(service = label, attempts = attempt, error = %e, "Giving up");
                    return Err(RetryError {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    warn!(service = label, attempt, max_attempts, error = %e, "Call failed, retrying");
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }
    }
}
