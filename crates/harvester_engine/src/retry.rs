//! Async driver for the per-resource retry state machine.

use std::future::Future;

use harvester_core::{RetryEvent, RetryPolicy};

use crate::quota::CancellationSignal;
use crate::FetchError;

/// How a retried operation ended. `attempts` counts attempts actually started.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { attempts: u32, value: T },
    /// The policy gave up; `last_error` is the failure of the final attempt.
    Exhausted { attempts: u32, last_error: FetchError },
    Cancelled { attempts: u32 },
}

/// Run `run_attempt` until it succeeds, the policy gives up, or `signal` fires.
///
/// The signal is only consulted before an attempt starts; an attempt already
/// running always completes. A backoff sleep ends early once the signal fires.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    signal: &CancellationSignal,
    mut run_attempt: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut state = policy.start();
    let mut attempts = 0;

    loop {
        state = policy.step(
            state,
            RetryEvent::CancellationChecked {
                cancelled: signal.is_signaled(),
            },
        );
        if state.is_terminal() {
            return RetryOutcome::Cancelled { attempts };
        }

        attempts += 1;
        let err = match run_attempt(attempts).await {
            Ok(value) => return RetryOutcome::Succeeded { attempts, value },
            Err(err) => err,
        };
        state = policy.step(state, RetryEvent::AttemptFailed(err.kind.retry_class()));
        if state.is_terminal() {
            return RetryOutcome::Exhausted {
                attempts,
                last_error: err,
            };
        }

        tokio::select! {
            _ = tokio::time::sleep(policy.backoff) => {}
            _ = signal.signaled() => {}
        }
        state = policy.step(state, RetryEvent::BackoffElapsed);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use harvester_core::{NotFoundPolicy, RetryPolicy};

    use super::{run_with_retry, RetryOutcome};
    use crate::quota::CancellationSignal;
    use crate::{FailureKind, FetchError};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
            not_found: NotFoundPolicy::Retry,
        }
    }

    #[tokio::test]
    async fn exhaustion_reports_the_final_attempts_error() {
        let outcome: RetryOutcome<()> =
            run_with_retry(&policy(3), &CancellationSignal::new(), |attempt| async move {
                Err(FetchError::new(
                    FailureKind::HttpStatus(500 + attempt as u16),
                    "server error",
                ))
            })
            .await;

        match outcome {
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error.kind, FailureKind::HttpStatus(503));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_carries_value_and_attempt_count() {
        let outcome = run_with_retry(&policy(3), &CancellationSignal::new(), |attempt| async move {
            if attempt < 2 {
                Err(FetchError::new(FailureKind::Timeout, "slow"))
            } else {
                Ok(attempt * 10)
            }
        })
        .await;

        assert!(matches!(
            outcome,
            RetryOutcome::Succeeded {
                attempts: 2,
                value: 20
            }
        ));
    }
}
