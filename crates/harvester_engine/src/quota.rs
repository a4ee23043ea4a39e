//! Run-scoped retrieval quota and the one-shot cancellation signal it drives.
//!
//! Increments are serialised through a mutex so the count stays exact; the
//! signal is a [`CancellationToken`], which any task can poll without taking
//! that mutex. The signal fires at most once, from inside the critical
//! section of the increment that first reaches the limit.
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Broadcast, irreversible "stop starting new work" flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    token: CancellationToken,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_signaled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has fired.
    pub async fn signaled(&self) {
        self.token.cancelled().await
    }

    fn fire(&self) {
        self.token.cancel();
    }
}

/// Result of recording one successful download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaUpdate {
    pub count: usize,
    /// True only for the single call that fired the cancellation signal.
    pub signaled_now: bool,
}

#[derive(Debug)]
pub struct QuotaTracker {
    count: Mutex<usize>,
    limit: usize,
    signal: CancellationSignal,
}

impl QuotaTracker {
    /// A limit of zero is already met: the signal fires immediately.
    pub fn new(limit: usize) -> Self {
        let signal = CancellationSignal::new();
        if limit == 0 {
            signal.fire();
        }
        Self {
            count: Mutex::new(0),
            limit,
            signal,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn count(&self) -> usize {
        *self.lock_count()
    }

    pub fn limit_reached(&self) -> bool {
        self.count() >= self.limit
    }

    pub fn observe_success(&self) -> QuotaUpdate {
        let mut count = self.lock_count();
        *count += 1;
        let signaled_now = *count >= self.limit && !self.signal.is_signaled();
        if signaled_now {
            self.signal.fire();
        }
        QuotaUpdate {
            count: *count,
            signaled_now,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.is_signaled()
    }

    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    fn lock_count(&self) -> std::sync::MutexGuard<'_, usize> {
        // A poisoned lock still guards a valid count.
        self.count.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
