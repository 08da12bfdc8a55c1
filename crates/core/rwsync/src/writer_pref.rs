//! Writer-preferring monitor lock.
//!
//! Adds a "writer pending" flag to the reader-counting monitor. Once a
//! writer sets the flag no new reader is admitted, so the writer waits for
//! at most the readers already inside. The monitor mutex is held only
//! while the bookkeeping changes, never across a critical section.
//!
//! Every state change that can unblock someone is a broadcast: a blocked
//! reader waits for the flag to clear, a blocked writer waits either for
//! the flag (another writer) or for the reader count, and both kinds park
//! on the same condition variable.

use crate::compat::{self, Condvar, Mutex};
use crate::raw::{LockTraits, RawRwLock};
use crate::stress;

struct State {
    readers: usize,
    /// A writer has announced intent or holds the lock.
    writer_pending: bool,
}

/// A lock that bounds writer wait by refusing new readers once a writer
/// is pending.
pub struct WriterPreferringLock {
    state: Mutex<State>,
    changed: Condvar,
}

impl WriterPreferringLock {
    /// Creates a new unlocked `WriterPreferringLock`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                readers: 0,
                writer_pending: false,
            }),
            changed: Condvar::new(),
        }
    }

    /// Returns the number of readers currently inside the critical section.
    pub fn readers(&self) -> usize {
        compat::lock(&self.state).readers
    }

    /// Returns `true` if a writer has announced intent or holds the lock.
    pub fn is_writer_pending(&self) -> bool {
        compat::lock(&self.state).writer_pending
    }
}

impl Default for WriterPreferringLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawRwLock for WriterPreferringLock {
    fn read_lock(&self) {
        stress::point();
        let mut state = compat::lock(&self.state);
        // Yield to a pending writer.
        while state.writer_pending {
            state = compat::wait(&self.changed, state);
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
        lock_misuse!(held, "WriterPreferringLock", "read_unlock of unlocked lock");
        if last {
            self.changed.notify_all();
        }
        stress::point();
    }

    fn write_lock(&self) {
        stress::point();
        let mut state = compat::lock(&self.state);
        while state.writer_pending {
            state = compat::wait(&self.changed, state);
        }
        // From here on no new reader is admitted.
        state.writer_pending = true;
        if state.readers > 0 {
            log::trace!("WriterPreferringLock: writer draining {} readers", state.readers);
        }
        while state.readers > 0 {
            state = compat::wait(&self.changed, state);
        }
    }

    fn write_unlock(&self) {
        let mut state = compat::lock(&self.state);
        let held = core::mem::replace(&mut state.writer_pending, false);
        drop(state);
        lock_misuse!(held, "WriterPreferringLock", "write_unlock of unlocked lock");
        // Blocked readers and a blocked writer all need to re-check.
        self.changed.notify_all();
        stress::point();
    }

    fn traits(&self) -> LockTraits {
        LockTraits::BLOCKING | LockTraits::WRITER_PREFERRING
    }

    fn is_idle(&self) -> bool {
        let state = compat::lock(&self.state);
        state.readers == 0 && !state.writer_pending
    }
}

#[cfg(all(test, not(any(loom, shuttle))))]
mod tests {
    use super::*;
    use crate::testing;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn flag_set_while_draining_readers() {
        let lock = Arc::new(WriterPreferringLock::new());
        lock.read_lock();

        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                lock.write_lock();
                lock.write_unlock();
            })
        };
        while !lock.is_writer_pending() {
            thread::yield_now();
        }
        assert_eq!(lock.readers(), 1);

        lock.read_unlock();
        writer.join().unwrap();
        assert!(!lock.is_writer_pending());
        assert!(lock.is_idle());
    }

    #[test]
    fn second_writer_waits_for_first() {
        let lock = Arc::new(WriterPreferringLock::new());
        lock.write_lock();

        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                lock.write_lock();
                lock.write_unlock();
            })
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!writer.is_finished());

        lock.write_unlock();
        writer.join().unwrap();
        assert!(lock.is_idle());
    }

    #[test]
    #[should_panic(expected = "WriterPreferringLock: read_unlock of unlocked lock")]
    fn read_unlock_without_lock_panics() {
        WriterPreferringLock::new().read_unlock();
    }

    #[test]
    #[should_panic(expected = "WriterPreferringLock: write_unlock of unlocked lock")]
    fn write_unlock_without_lock_panics() {
        WriterPreferringLock::new().write_unlock();
    }

    #[test]
    fn scenarios() {
        testing::run_common_scenarios(WriterPreferringLock::new);
    }

    #[test]
    fn writer_preference() {
        testing::writer_blocks_later_readers(WriterPreferringLock::new);
    }
}
