//! Retry with bounded exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::error::AmpgateError;

/// Retry policy configuration.
///
/// The delay between attempts doubles from `initial_backoff` up to
/// `max_backoff` and nothing randomizes it, so a policy of five
/// attempts waits 1s, 2s, 4s, 8s between tries with the defaults.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Execute an async operation with retry.
    ///
    /// Non-retryable errors surface immediately; retryable ones are
    /// retried until the attempt budget runs out, at which point the
    /// last error is returned. A zero-attempt policy never runs the
    /// operation and reports a configuration error.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, AmpgateError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AmpgateError>>,
    {
        let mut backoff = self.initial_backoff;
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !e.is_retryable() || attempt + 1 >= self.max_attempts {
                        return Err(e);
                    }

                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Retrying after error"
                    );

                    tokio::time::sleep(backoff).await;

                    backoff = Duration::from_secs_f64(
                        (backoff.as_secs_f64() * self.multiplier).min(self.max_backoff.as_secs_f64()),
                    );

                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AmpgateError::Configuration("retry budget is zero".to_string())))
    }
}
