//! Bounded retry with exponential backoff for one agent invocation.

use crate::config::DispatchParams;
use crate::ports::agent_invoker::InvokeError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Final result of a retried operation, with the invocations it took
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T, InvokeError>,
    /// Invocations made, including the first one
    pub attempts: u32,
}

/// Retries transient failures with backoff `base * 2^retry`
///
/// With a one second base the waits are 2s, 4s and 8s, so three retries
/// mean four invocations in total. Non-transient failures surface at once;
/// exhaustion surfaces the last error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_params(&DispatchParams::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    pub fn from_params(params: &DispatchParams) -> Self {
        Self::new(params.max_retries, params.base_backoff)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the given retry (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Run `op` until it succeeds, fails permanently or retries run out
    ///
    /// `on_retry` is called with the retry number, the error being retried
    /// and the delay before the next attempt. Cancellation interrupts both
    /// an in-flight attempt and a backoff sleep.
    pub async fn run<T, F, Fut, R>(
        &self,
        cancel: &CancellationToken,
        mut on_retry: R,
        mut op: F,
    ) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InvokeError>>,
        R: FnMut(u32, &InvokeError, Duration),
    {
        let mut attempts = 0;
        loop {
            if cancel.is_cancelled() {
                return Attempted {
                    result: Err(InvokeError::Cancelled),
                    attempts,
                };
            }

            attempts += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(InvokeError::Cancelled),
                r = op() => r,
            };

            match result {
                Err(e) if e.is_transient() && attempts <= self.max_retries => {
                    let delay = self.backoff(attempts);
                    debug!(
                        "Transient failure on attempt {}: {} (retrying in {:?})",
                        attempts, e, delay
                    );
                    on_retry(attempts, &e, delay);

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Attempted {
                                result: Err(InvokeError::Cancelled),
                                attempts,
                            };
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                result => return Attempted { result, attempts },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_back_off_then_surface() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut delays = Vec::new();
        let start = Instant::now();

        let attempted: Attempted<()> = policy
            .run(
                &cancel,
                |_, _, delay| delays.push(delay),
                || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.lock().unwrap().push(start.elapsed());
                        Err(InvokeError::RateLimited("429 Too Many Requests".into()))
                    }
                },
            )
            .await;

        assert_eq!(attempted.attempts, 4);
        assert_eq!(
            attempted.result,
            Err(InvokeError::RateLimited("429 Too Many Requests".into()))
        );
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
        let offsets: Vec<u64> = calls.lock().unwrap().iter().map(|d| d.as_secs()).collect();
        assert_eq!(offsets, vec![0, 2, 6, 14]);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let cancel = CancellationToken::new();
        let mut retries = 0;

        let attempted: Attempted<()> = policy
            .run(
                &cancel,
                |_, _, _| retries += 1,
                || async { Err(InvokeError::RequestFailed("invalid api key".into())) },
            )
            .await;

        assert_eq!(attempted.attempts, 1);
        assert_eq!(retries, 0);
        assert!(attempted.result.is_err());
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let cancel = CancellationToken::new();
        let mut remaining_failures = 2;

        let attempted = policy
            .run(
                &cancel,
                |_, _, _| {},
                || {
                    let fail = remaining_failures > 0;
                    remaining_failures -= 1;
                    async move {
                        if fail {
                            Err(InvokeError::Other("service unavailable".into()))
                        } else {
                            Ok("done")
                        }
                    }
                },
            )
            .await;

        assert_eq!(attempted.attempts, 3);
        assert_eq!(attempted.result, Ok("done"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            canceller.cancel();
        });

        let attempted: Attempted<()> = policy
            .run(
                &cancel,
                |_, _, _| {},
                || async { Err(InvokeError::Timeout) },
            )
            .await;

        // First attempt at 0s, second at 2s, cancelled during the 4s wait
        assert_eq!(attempted.attempts, 2);
        assert_eq!(attempted.result, Err(InvokeError::Cancelled));
    }
}
