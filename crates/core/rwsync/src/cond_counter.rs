//! Reader-counting lock with a sleeping writer.
//!
//! Same bookkeeping as [`SpinCounterLock`](crate::SpinCounterLock), but a
//! monitor (mutex plus condition variables) replaces the polling loop: a
//! writer sleeps until the last reader leaves and signals it.
//!
//! Still reader-preferring. Between the last reader's signal and the
//! writer re-acquiring the monitor, a newly arriving reader can slip in and
//! push the writer back to sleep, so writers can starve.

use crate::compat::{self, Condvar, Mutex};
use crate::raw::{LockTraits, RawRwLock};
use crate::stress;

/// Monitor-protected state.
struct State {
    readers: usize,
    /// A writer is inside the critical section.
    writer: bool,
}

/// A reader-preferring lock whose writer blocks on a condition variable.
pub struct CondCounterLock {
    state: Mutex<State>,
    /// Signalled (one waiter) when the lock may be free for a writer.
    writer_cv: Condvar,
    /// Broadcast when a writer leaves; readers only ever wait for that.
    reader_cv: Condvar,
}

impl CondCounterLock {
    /// Creates a new unlocked `CondCounterLock`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                readers: 0,
                writer: false,
            }),
            writer_cv: Condvar::new(),
            reader_cv: Condvar::new(),
        }
    }

    /// Returns the number of readers currently inside the critical section.
    pub fn readers(&self) -> usize {
        compat::lock(&self.state).readers
    }
}

impl Default for CondCounterLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawRwLock for CondCounterLock {
    fn read_lock(&self) {
        stress::point();
        let mut state = compat::lock(&self.state);
        while state.writer {
            state = compat::wait(&self.reader_cv, state);
        }
        state.readers += 1;
    }

    fn read_unlock(&self) {
        let mut state = compat::lock(&self.state);
        let held = state.readers > 0;
        if held {
            state.readers -= 1;
        }
        let last = state.readers == 0;
        drop(state);
        lock_misuse!(held, "CondCounterLock", "read_unlock of unlocked lock (reader count negative)");
        if last {
            self.writer_cv.notify_one();
        }
        stress::point();
    }

    fn write_lock(&self) {
        stress::point();
        let mut state = compat::lock(&self.state);
        // Loop: a reader may have entered between the signal and our wakeup.
        while state.readers > 0 || state.writer {
            if state.readers > 0 {
                log::trace!("CondCounterLock: writer waiting for {} readers", state.readers);
            }
            state = compat::wait(&self.writer_cv, state);
        }
        state.writer = true;
    }

    fn write_unlock(&self) {
        let mut state = compat::lock(&self.state);
        let held = core::mem::replace(&mut state.writer, false);
        drop(state);
        lock_misuse!(held, "CondCounterLock", "write_unlock of unlocked lock");
        // One writer may proceed; every parked reader re-checks.
        self.writer_cv.notify_one();
        self.reader_cv.notify_all();
        stress::point();
    }

    fn traits(&self) -> LockTraits {
        LockTraits::BLOCKING
    }

    fn is_idle(&self) -> bool {
        let state = compat::lock(&self.state);
        state.readers == 0 && !state.writer
    }
}
