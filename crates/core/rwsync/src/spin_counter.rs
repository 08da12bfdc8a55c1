//! Reader-counting lock with a busy-polling writer.
//!
//! The simplest algorithm in the catalog. A spin mutex protects a reader
//! count; a writer keeps re-taking the mutex until it observes zero
//! readers and then holds on to it for the whole write section.
//!
//! A steady stream of readers can starve a writer indefinitely, and a
//! waiting writer burns a CPU the whole time.

use core::cell::UnsafeCell;

use crate::compat::{self, AtomicBool, Ordering};
use crate::mutex::SpinMutex;
use crate::raw::{LockTraits, RawRwLock};

/// A reader-preferring lock whose writer busy-polls the reader count.
pub struct SpinCounterLock {
    mutex: SpinMutex,
    /// Number of readers inside the critical section. Guarded by `mutex`.
    readers: UnsafeCell<usize>,
    /// Set while a writer holds `mutex` as its write lock.
    writer: AtomicBool,
}

// SAFETY: `readers` is only accessed while `mutex` is held.
unsafe impl Send for SpinCounterLock {}
unsafe impl Sync for SpinCounterLock {}

impl SpinCounterLock {
    /// Creates a new unlocked `SpinCounterLock`.
    pub fn new() -> Self {
        Self {
            mutex: SpinMutex::new(),
            readers: UnsafeCell::new(0),
            writer: AtomicBool::new(false),
        }
    }

    /// Returns the number of readers currently inside the critical section.
    pub fn readers(&self) -> usize {
        self.mutex.lock();
        // SAFETY: `mutex` is held.
        let n = unsafe { *self.readers.get() };
        self.mutex.unlock();
        n
    }
}

impl Default for SpinCounterLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawRwLock for SpinCounterLock {
    fn read_lock(&self) {
        self.mutex.lock();
        // SAFETY: `mutex` is held.
        unsafe { *self.readers.get() += 1 };
        self.mutex.unlock();
    }

    fn read_unlock(&self) {
        // The writer keeps `mutex` for its whole section; taking it here
        // would spin until the writer leaves.
        lock_misuse!(
            !self.writer.load(Ordering::Acquire),
            "SpinCounterLock",
            "read_unlock while a writer holds the lock"
        );
        self.mutex.lock();
        // SAFETY: `mutex` is held.
        let readers = unsafe { &mut *self.readers.get() };
        let held = *readers > 0;
        if held {
            *readers -= 1;
        }
        self.mutex.unlock();
        lock_misuse!(held, "SpinCounterLock", "read_unlock of unlocked lock");
    }

    fn write_lock(&self) {
        loop {
            self.mutex.lock();
            // SAFETY: `mutex` is held.
            if unsafe { *self.readers.get() } == 0 {
                break;
            }
            self.mutex.unlock();
            compat::relax();
        }
        // The mutex stays held until `write_unlock`.
        self.writer.store(true, Ordering::Release);
    }

    fn write_unlock(&self) {
        let was_writer = self.writer.swap(false, Ordering::AcqRel);
        lock_misuse!(was_writer, "SpinCounterLock", "write_unlock of unlocked lock");
        self.mutex.unlock();
    }

    fn traits(&self) -> LockTraits {
        LockTraits::empty()
    }

    fn is_idle(&self) -> bool {
        if !self.mutex.try_lock() {
            return false;
        }
        // SAFETY: `mutex` is held.
        let readers = unsafe { *self.readers.get() };
        self.mutex.unlock();
        readers == 0
    }
}
