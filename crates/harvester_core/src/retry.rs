//! Per-resource retry state machine.
//!
//! The machine is pure: the engine feeds it events (cancellation checks, attempt
//! results, elapsed backoffs) and performs whatever the resulting state asks for.
use std::time::Duration;

/// Retry-relevant classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Network, status, body-read or persistence failure worth another try.
    Transient,
    /// The server answered "not found".
    NotFound,
}

/// How an HTTP "not found" answer is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundPolicy {
    /// Retry like any other failure.
    #[default]
    Retry,
    /// Stop after the first "not found".
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt number `attempt` (1-based) is about to run.
    Attempting { attempt: u32 },
    /// Attempt number `attempt` failed; waiting out the backoff.
    Backoff { attempt: u32 },
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
    /// Cancellation was observed before attempt `attempts + 1` started.
    Cancelled { attempts: u32 },
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Succeeded { .. } | RetryState::Exhausted { .. } | RetryState::Cancelled { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEvent {
    /// The cancellation signal was read at the top of an attempt.
    CancellationChecked { cancelled: bool },
    AttemptSucceeded,
    AttemptFailed(FailureClass),
    BackoffElapsed,
}

/// Fixed retry ceiling with a constant delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay between a failed attempt and the next one.
    pub backoff: Duration,
    pub not_found: NotFoundPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
            not_found: NotFoundPolicy::Retry,
        }
    }
}

impl RetryPolicy {
    pub fn start(&self) -> RetryState {
        RetryState::Attempting { attempt: 1 }
    }

    /// Pure transition function. Events that do not apply to `state` leave it unchanged.
    pub fn step(&self, state: RetryState, event: RetryEvent) -> RetryState {
        match (state, event) {
            (RetryState::Attempting { attempt }, RetryEvent::CancellationChecked { cancelled }) => {
                if cancelled {
                    RetryState::Cancelled {
                        attempts: attempt.saturating_sub(1),
                    }
                } else {
                    state
                }
            }
            (RetryState::Attempting { attempt }, RetryEvent::AttemptSucceeded) => {
                RetryState::Succeeded { attempts: attempt }
            }
            (RetryState::Attempting { attempt }, RetryEvent::AttemptFailed(class)) => {
                let give_up_now =
                    class == FailureClass::NotFound && self.not_found == NotFoundPolicy::GiveUp;
                if give_up_now || attempt >= self.max_attempts {
                    RetryState::Exhausted { attempts: attempt }
                } else {
                    RetryState::Backoff { attempt }
                }
            }
            (RetryState::Backoff { attempt }, RetryEvent::BackoffElapsed) => {
                RetryState::Attempting {
                    attempt: attempt + 1,
                }
            }
            _ => state,
        }
    }
}
