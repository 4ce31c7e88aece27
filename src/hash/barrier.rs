//! Completion barrier for an open-ended stream of jobs
//!
//! The driver does not know how many files the walk will produce, so it
//! cannot wait for a fixed count. Instead one signed counter starts at
//! [`SENTINEL_BIAS`]; every enqueued job adds one, every finished job
//! subtracts one, and the bias is subtracted exactly once when discovery
//! stops. While the bias is still present the counter is at least
//! `SENTINEL_BIAS - in_flight`, which is positive for any realistic number of
//! outstanding jobs. After debiasing the counter equals
//! `discovered - completed`.
//!
//! Invariant: the counter reads zero if and only if discovery has finished
//! and every discovered job has completed. Once it reads zero it never
//! changes again.
//!
//! Waiting is event driven: whoever moves the counter to zero wakes the
//! driver through a condition variable instead of the driver polling.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Initial bias, 2^62
pub const SENTINEL_BIAS: i64 = 1 << 62;

pub struct CompletionBarrier {
    counter: AtomicI64,
    debiased: AtomicBool,
    lock: Mutex<()>,
    drained: Condvar,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self {
            counter: AtomicI64::new(SENTINEL_BIAS),
            debiased: AtomicBool::new(false),
            lock: Mutex::new(()),
            drained: Condvar::new(),
        }
    }

    /// Account for one job handed to the queue
    pub fn enqueue(&self) {
        debug_assert!(
            !self.debiased.load(Ordering::Acquire),
            "job enqueued after discovery finished"
        );
        self.counter.fetch_add(1, Ordering::AcqRel);
    }

    /// Account for one finished job, successful or not
    pub fn complete(&self) {
        let previous = self.counter.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "more completions than enqueued jobs");
        if previous == 1 {
            self.wake();
        }
    }

    /// Ticket that calls [`complete`](Self::complete) when dropped
    pub fn guard(&self) -> CompletionGuard<'_> {
        CompletionGuard { barrier: self }
    }

    /// Remove the bias once the walk has stopped, successfully or not
    ///
    /// Only the first call has any effect.
    pub fn finish_discovery(&self) {
        if self.debiased.swap(true, Ordering::AcqRel) {
            return;
        }
        let previous = self.counter.fetch_sub(SENTINEL_BIAS, Ordering::AcqRel);
        if previous == SENTINEL_BIAS {
            self.wake();
        }
    }

    pub fn is_discovery_finished(&self) -> bool {
        self.debiased.load(Ordering::Acquire)
    }

    /// Raw counter value, bias included while discovery is running
    pub fn value(&self) -> i64 {
        self.counter.load(Ordering::Acquire)
    }

    /// Jobs discovered but not yet completed
    pub fn outstanding(&self) -> i64 {
        let value = self.value();
        if value >= SENTINEL_BIAS / 2 {
            value - SENTINEL_BIAS
        } else {
            value
        }
    }

    pub fn is_drained(&self) -> bool {
        self.value() == 0
    }

    /// Block until discovery has finished and every job has completed
    pub fn wait(&self) {
        let mut guard = self.lock();
        while !self.is_drained() {
            guard = self
                .drained
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`
    ///
    /// Returns true if the barrier drained in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        while !self.is_drained() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .drained
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    // The waiter checks the counter while holding the lock, so taking it here
    // before notifying rules out a lost wakeup.
    fn wake(&self) {
        let _guard = self.lock();
        self.drained.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks one job as complete when dropped, including during unwinding
pub struct CompletionGuard<'a> {
    barrier: &'a CompletionBarrier,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.barrier.complete();
    }
}
