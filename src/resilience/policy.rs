//! Retry + circuit breaker + deadline, composed.
//!
//! # Responsibilities
//! - Run one logical call as a sequence of attempts
//! - Consult the breaker before every attempt
//! - Bound the whole sequence, delays included, by one deadline
//!
//! # Design Decisions
//! - Timeout errors are distinct from other errors
//! - An open breaker ends the sequence at once; it is never retried
//! - Cancelling the returned future cancels the attempt or sleep in progress
//! - An attempt cut off by the deadline counts as a breaker failure

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::retries::{RetryPolicy, Verdict};

/// Why the policy gave up without an upstream outcome to show for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("circuit for '{channel}' is open, retry after {retry_after:?}")]
    CircuitOpen {
        channel: String,
        retry_after: Duration,
    },

    #[error("deadline of {0:?} elapsed")]
    TimedOut(Duration),
}

const IDLE: u8 = 0;
const ATTEMPT: u8 = 1;
const TRIAL: u8 = 2;

/// Resilience policy for one outbound channel.
#[derive(Debug, Clone)]
pub struct ResiliencePolicy {
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
    deadline: Duration,
}

impl ResiliencePolicy {
    pub fn new(retry: RetryPolicy, breaker: Arc<CircuitBreaker>, deadline: Duration) -> Self {
        Self {
            retry,
            breaker,
            deadline,
        }
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `call` until `classify` accepts an outcome, retries run out, the
    /// breaker refuses, or the deadline passes.
    ///
    /// The inner `Result` is the last outcome of `call`, which may still be
    /// an error when retries were exhausted or the failure was permanent.
    pub async fn execute<T, E, F, Fut, C>(
        &self,
        operation: &str,
        mut call: F,
        classify: C,
    ) -> Result<Result<T, E>, PolicyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&Result<T, E>) -> Verdict,
    {
        let in_flight = AtomicU8::new(IDLE);

        match tokio::time::timeout(
            self.deadline,
            self.attempts(operation, &mut call, &classify, &in_flight),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                let cut_off = in_flight.load(Ordering::SeqCst);
                if cut_off != IDLE {
                    // The attempt's permit was dropped unresolved.
                    self.breaker.record_cut_off(cut_off == TRIAL);
                }
                tracing::warn!(
                    operation,
                    deadline = ?self.deadline,
                    attempt_cut_off = cut_off != IDLE,
                    "Upstream call sequence timed out"
                );
                Err(PolicyError::TimedOut(self.deadline))
            }
        }
    }

    async fn attempts<T, E, F, Fut, C>(
        &self,
        operation: &str,
        call: &mut F,
        classify: &C,
        in_flight: &AtomicU8,
    ) -> Result<Result<T, E>, PolicyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&Result<T, E>) -> Verdict,
    {
        let mut retry = 0;

        loop {
            let permit = self.breaker.try_acquire().map_err(|rejected| {
                tracing::warn!(
                    operation,
                    channel = %self.breaker.name(),
                    retry_after = ?rejected.retry_after,
                    "Circuit open, failing fast"
                );
                PolicyError::CircuitOpen {
                    channel: self.breaker.name().to_string(),
                    retry_after: rejected.retry_after,
                }
            })?;

            in_flight.store(
                if permit.is_trial() { TRIAL } else { ATTEMPT },
                Ordering::SeqCst,
            );
            let outcome = call().await;
            in_flight.store(IDLE, Ordering::SeqCst);

            match classify(&outcome) {
                Verdict::Success | Verdict::Permanent => {
                    permit.success();
                    return Ok(outcome);
                }
                Verdict::Transient => {
                    permit.failure();
                    if retry >= self.retry.max_retries() {
                        tracing::warn!(operation, attempts = retry + 1, "Retries exhausted");
                        return Ok(outcome);
                    }

                    retry += 1;
                    let delay = self.retry.delay_for(retry);
                    tracing::info!(operation, retry, delay = ?delay, "Retrying after transient failure");
                    metrics::record_retry(operation);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::circuit_breaker::CircuitState;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy(breaker: Arc<CircuitBreaker>) -> ResiliencePolicy {
        ResiliencePolicy::new(
            RetryPolicy::new(3, Duration::from_secs(2)),
            breaker,
            Duration::from_secs(40),
        )
    }

    fn breaker() -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::with_settings("test", 5, Duration::from_secs(30)))
    }

    fn ok_or_transient(outcome: &Result<u32, &'static str>) -> Verdict {
        if outcome.is_ok() {
            Verdict::Success
        } else {
            Verdict::Transient
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_then_success_waits_two_and_four_seconds() {
        let calls = AtomicU32::new(0);
        let policy = policy(breaker());
        let start = Instant::now();

        let result = policy
            .execute(
                "test",
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err("boom")
                        } else {
                            Ok(n)
                        }
                    }
                },
                ok_or_transient,
            )
            .await
            .unwrap();

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_last_outcome() {
        let calls = AtomicU32::new(0);
        let policy = policy(breaker());
        let start = Instant::now();

        let result = policy
            .execute(
                "test",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<u32, _>("still down") }
                },
                ok_or_transient,
            )
            .await
            .unwrap();

        assert_eq!(result, Err("still down"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_not_retried() {
        let calls = AtomicU32::new(0);
        let cb = breaker();
        let policy = policy(cb.clone());

        let result = policy
            .execute(
                "test",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<u32, _>("not found") }
                },
                |_| Verdict::Permanent,
            )
            .await
            .unwrap();

        assert_eq!(result, Err("not found"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_call_fails_fast_until_break_elapses() {
        let calls = AtomicU32::new(0);
        let cb = breaker();
        let policy = ResiliencePolicy::new(
            RetryPolicy::new(0, Duration::from_secs(2)),
            cb.clone(),
            Duration::from_secs(40),
        );
        let failing = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>("503") }
        };

        for _ in 0..5 {
            assert!(policy.execute("test", failing, ok_or_transient).await.is_ok());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        let err = policy
            .execute("test", failing, ok_or_transient)
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::CircuitOpen { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 5, "no attempt while open");

        tokio::time::advance(Duration::from_secs(30)).await;
        let trial = policy
            .execute("test", || async { Ok::<u32, &str>(7) }, ok_or_transient)
            .await
            .unwrap();
        assert_eq!(trial, Ok(7));
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_breaker_stops_retry_sequence() {
        let calls = AtomicU32::new(0);
        let cb = Arc::new(CircuitBreaker::with_settings("test", 2, Duration::from_secs(30)));
        let policy = policy(cb);

        let err = policy
            .execute(
                "test",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<u32, _>("503") }
                },
                ok_or_transient,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PolicyError::CircuitOpen { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_attempts_cut_off_by_deadline_trip_breaker() {
        let cb = breaker();
        let policy = ResiliencePolicy::new(
            RetryPolicy::new(3, Duration::from_secs(2)),
            cb.clone(),
            Duration::from_secs(5),
        );
        let hang = || std::future::pending::<Result<u32, &'static str>>();

        for n in 1..=4 {
            let err = policy.execute("test", hang, ok_or_transient).await.unwrap_err();
            assert_eq!(err, PolicyError::TimedOut(Duration::from_secs(5)));
            assert_eq!(cb.consecutive_failures(), n);
        }

        let _ = policy.execute("test", hang, ok_or_transient).await;
        assert_eq!(cb.state(), CircuitState::Open);

        let err = policy.execute("test", hang, ok_or_transient).await.unwrap_err();
        assert!(matches!(err, PolicyError::CircuitOpen { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_trial_reopens_breaker() {
        let cb = breaker();
        for _ in 0..5 {
            cb.try_acquire().unwrap().failure();
        }
        tokio::time::advance(Duration::from_secs(30)).await;

        let policy = ResiliencePolicy::new(
            RetryPolicy::new(3, Duration::from_secs(2)),
            cb.clone(),
            Duration::from_secs(5),
        );
        let err = policy
            .execute(
                "test",
                || std::future::pending::<Result<u32, &'static str>>(),
                ok_or_transient,
            )
            .await
            .unwrap_err();

        assert_eq!(err, PolicyError::TimedOut(Duration::from_secs(5)));
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_during_backoff_counts_only_finished_attempts() {
        let cb = breaker();
        let policy = ResiliencePolicy::new(
            RetryPolicy::new(3, Duration::from_secs(2)),
            cb.clone(),
            Duration::from_secs(5),
        );

        // Attempts at 0s and 2s fail; the deadline lands in the 4s sleep.
        let err = policy
            .execute("test", || async { Err::<u32, _>("503") }, ok_or_transient)
            .await
            .unwrap_err();

        assert_eq!(err, PolicyError::TimedOut(Duration::from_secs(5)));
        assert_eq!(cb.consecutive_failures(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_covers_whole_sequence() {
        let policy = ResiliencePolicy::new(
            RetryPolicy::new(3, Duration::from_secs(2)),
            breaker(),
            Duration::from_secs(5),
        );
        let start = Instant::now();

        let err = policy
            .execute("test", || async { Err::<u32, _>("slow") }, ok_or_transient)
            .await
            .unwrap_err();

        assert_eq!(err, PolicyError::TimedOut(Duration::from_secs(5)));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}
