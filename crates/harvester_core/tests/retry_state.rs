use std::time::Duration;

use harvester_core::{FailureClass, NotFoundPolicy, RetryEvent, RetryPolicy, RetryState};

fn policy(max_attempts: u32, not_found: NotFoundPolicy) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::from_millis(10),
        not_found,
    }
}

/// Drive the machine with every attempt failing, counting attempts made.
fn run_all_failing(policy: &RetryPolicy, class: FailureClass) -> (RetryState, u32) {
    let mut state = policy.start();
    let mut attempts = 0;
    while !state.is_terminal() {
        state = match state {
            RetryState::Attempting { .. } => {
                let checked =
                    policy.step(state, RetryEvent::CancellationChecked { cancelled: false });
                attempts += 1;
                policy.step(checked, RetryEvent::AttemptFailed(class))
            }
            RetryState::Backoff { .. } => policy.step(state, RetryEvent::BackoffElapsed),
            terminal => terminal,
        };
    }
    (state, attempts)
}

#[test]
fn failing_resource_is_attempted_exactly_ceiling_times() {
    let policy = policy(3, NotFoundPolicy::Retry);
    let (state, attempts) = run_all_failing(&policy, FailureClass::Transient);

    assert_eq!(attempts, 3);
    assert_eq!(state, RetryState::Exhausted { attempts: 3 });
}

#[test]
fn not_found_is_retried_by_default() {
    let policy = policy(3, NotFoundPolicy::Retry);
    let (_, attempts) = run_all_failing(&policy, FailureClass::NotFound);
    assert_eq!(attempts, 3);
}

#[test]
fn not_found_gives_up_immediately_when_configured() {
    let policy = policy(3, NotFoundPolicy::GiveUp);
    let (state, attempts) = run_all_failing(&policy, FailureClass::NotFound);

    assert_eq!(attempts, 1);
    assert_eq!(state, RetryState::Exhausted { attempts: 1 });
}

#[test]
fn cancellation_before_first_attempt_makes_no_attempt() {
    let policy = RetryPolicy::default();
    let state = policy.step(
        policy.start(),
        RetryEvent::CancellationChecked { cancelled: true },
    );
    assert_eq!(state, RetryState::Cancelled { attempts: 0 });
}

#[test]
fn cancellation_after_backoff_stops_retrying() {
    let policy = RetryPolicy::default();
    let state = policy.step(policy.start(), RetryEvent::AttemptFailed(FailureClass::Transient));
    assert_eq!(state, RetryState::Backoff { attempt: 1 });

    let state = policy.step(state, RetryEvent::BackoffElapsed);
    assert_eq!(state, RetryState::Attempting { attempt: 2 });

    let state = policy.step(state, RetryEvent::CancellationChecked { cancelled: true });
    assert_eq!(state, RetryState::Cancelled { attempts: 1 });
}

#[test]
fn success_records_attempt_count() {
    let policy = RetryPolicy::default();
    let state = policy.step(policy.start(), RetryEvent::AttemptFailed(FailureClass::Transient));
    let state = policy.step(state, RetryEvent::BackoffElapsed);
    let state = policy.step(state, RetryEvent::AttemptSucceeded);
    assert_eq!(state, RetryState::Succeeded { attempts: 2 });
}

#[test]
fn terminal_states_ignore_further_events() {
    let policy = RetryPolicy::default();
    let done = RetryState::Succeeded { attempts: 1 };
    assert_eq!(policy.step(done, RetryEvent::BackoffElapsed), done);
    assert_eq!(
        policy.step(done, RetryEvent::AttemptFailed(FailureClass::Transient)),
        done
    );
}

#[test]
fn cancelling_a_zeroth_attempt_does_not_underflow() {
    let policy = RetryPolicy::default();
    let state = policy.step(
        RetryState::Attempting { attempt: 0 },
        RetryEvent::CancellationChecked { cancelled: true },
    );
    assert_eq!(state, RetryState::Cancelled { attempts: 0 });
}
