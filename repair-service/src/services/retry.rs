use std::future::Future;
use std::time::Duration;

use backoff::future::retry;
use backoff::ExponentialBackoff;

use super::error::RepairError;
use super::metrics::CONFLICT_RETRIES_TOTAL;

/// Budget for replaying versioned read-modify-write cycles.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(5),
            max_elapsed: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            current_interval: self.initial_interval,
            max_interval: self.max_elapsed,
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// budget runs out. The last retryable error is returned in that case.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut op: F) -> Result<T, RepairError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RepairError>>,
    {
        let mut attempt: u32 = 0;
        retry(self.backoff(), || {
            attempt += 1;
            let current = attempt;
            let fut = op();
            async move {
                match fut.await {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_retryable() => {
                        tracing::debug!(operation, attempt = current, error = %e, "Retrying after conflict");
                        CONFLICT_RETRIES_TOTAL.with_label_values(&[operation]).inc();
                        Err(backoff::Error::transient(e))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        })
        .await
    }
}
