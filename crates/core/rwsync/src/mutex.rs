//! Guard-less mutual exclusion.
//!
//! The reader-writer locks in this crate hold a mutex across the boundary
//! between `write_lock` and `write_unlock`, which are separate calls. A
//! guard-based mutex cannot express that, so these mutexes expose plain
//! `lock`/`unlock` pairs and check for unmatched unlocks.

use crate::compat::{self, AtomicBool, Condvar, Mutex, Ordering};
use crate::stress;

/// A spin-based mutual exclusion lock.
///
/// Uses test-and-test-and-set (TTAS) to reduce cache-line contention.
pub struct SpinMutex {
    locked: AtomicBool,
}

impl SpinMutex {
    /// Creates a new unlocked `SpinMutex`.
    pub fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Acquires the mutex, spinning until it becomes available.
    pub fn lock(&self) {
        stress::point();
        loop {
            // Fast path: try to acquire directly.
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }

            // TTAS: spin on a read (shared cache line) until it looks free.
            while self.locked.load(Ordering::Relaxed) {
                compat::relax();
            }
        }
    }

    /// Attempts to acquire the mutex without spinning.
    pub fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the mutex.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is not held.
    pub fn unlock(&self) {
        let was_locked = self.locked.swap(false, Ordering::Release);
        lock_misuse!(was_locked, "SpinMutex", "unlock of unlocked mutex");
        stress::point();
    }

    /// Returns `true` if the mutex is currently held.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl Default for SpinMutex {
    fn default() -> Self {
        Self::new()
    }
}

/// A sleeping mutual exclusion lock.
///
/// Contended callers park on a condition variable instead of spinning.
/// Wakeup order is whatever the platform condition variable provides.
pub struct BlockingMutex {
    locked: Mutex<bool>,
    unlocked: Condvar,
}

impl BlockingMutex {
    /// Creates a new unlocked `BlockingMutex`.
    pub fn new() -> Self {
        Self {
            locked: Mutex::new(false),
            unlocked: Condvar::new(),
        }
    }

    /// Acquires the mutex, sleeping until it becomes available.
    pub fn lock(&self) {
        stress::point();
        let mut locked = compat::lock(&self.locked);
        while *locked {
            locked = compat::wait(&self.unlocked, locked);
        }
        *locked = true;
    }

    /// Attempts to acquire the mutex without sleeping.
    pub fn try_lock(&self) -> bool {
        let mut locked = compat::lock(&self.locked);
        if *locked {
            false
        } else {
            *locked = true;
            true
        }
    }

    /// Releases the mutex and wakes one sleeper.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is not held.
    pub fn unlock(&self) {
        let was_locked = core::mem::replace(&mut *compat::lock(&self.locked), false);
        lock_misuse!(was_locked, "BlockingMutex", "unlock of unlocked mutex");
        self.unlocked.notify_one();
        stress::point();
    }

    /// Returns `true` if the mutex is currently held.
    pub fn is_locked(&self) -> bool {
        *compat::lock(&self.locked)
    }
}

impl Default for BlockingMutex {
    fn default() -> Self {
        Self::new()
    }
}
