//! Reader-writer lock built from one weighted semaphore.
//!
//! Readers take one unit, a writer takes the whole capacity. Mutual
//! exclusion falls out of the accounting: the full capacity is only
//! available when no reader holds a unit.

use std::time::Duration;

use crate::compat::{AtomicBool, Ordering};
use crate::raw::{LockTraits, RawRwLock};
use crate::semaphore::{AcquireError, WeightedSemaphore};

/// Capacity of the underlying semaphore. Bounds the number of concurrent
/// readers.
pub const MAX_WEIGHT: u64 = 1 << 30;

/// A reader-writer lock whose fairness is the semaphore's FIFO queue.
///
/// Because the semaphore admits strictly in arrival order, a reader that
/// arrives after a queued writer waits behind it. Besides the blocking
/// capability set, the lock offers non-blocking and timed acquisition that
/// report failure instead of proceeding unlocked.
pub struct WeightedSemaphoreLock {
    sem: WeightedSemaphore,
    /// Set while a writer holds the full capacity. Weight alone cannot
    /// tell a writer from `capacity` readers.
    writer: AtomicBool,
}

impl WeightedSemaphoreLock {
    /// Creates a new unlocked lock with capacity [`MAX_WEIGHT`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_WEIGHT)
    }

    /// Creates a new unlocked lock admitting at most `max_readers`
    /// concurrent readers.
    ///
    /// # Panics
    ///
    /// Panics if `max_readers` is zero.
    pub fn with_capacity(max_readers: u64) -> Self {
        assert!(max_readers > 0, "WeightedSemaphoreLock: capacity must be non-zero");
        Self {
            sem: WeightedSemaphore::new(max_readers),
            writer: AtomicBool::new(false),
        }
    }

    /// Returns the semaphore capacity (the weight a writer takes).
    pub fn capacity(&self) -> u64 {
        self.sem.capacity()
    }

    /// Acquires a read lock only if it is available right now.
    pub fn try_read_lock(&self) -> Result<(), AcquireError> {
        self.sem.try_acquire(1)
    }

    /// Acquires the write lock only if it is available right now.
    pub fn try_write_lock(&self) -> Result<(), AcquireError> {
        self.sem.try_acquire(self.capacity())?;
        self.writer.store(true, Ordering::Release);
        Ok(())
    }

    /// Acquires a read lock, giving up after `timeout`.
    pub fn read_lock_timeout(&self, timeout: Duration) -> Result<(), AcquireError> {
        self.sem.acquire_timeout(1, timeout)
    }

    /// Acquires the write lock, giving up after `timeout`.
    pub fn write_lock_timeout(&self, timeout: Duration) -> Result<(), AcquireError> {
        self.sem.acquire_timeout(self.capacity(), timeout)?;
        self.writer.store(true, Ordering::Release);
        Ok(())
    }

    /// Returns `true` if a writer holds the lock.
    pub fn is_write_locked(&self) -> bool {
        self.writer.load(Ordering::Acquire)
    }
}

impl Default for WeightedSemaphoreLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawRwLock for WeightedSemaphoreLock {
    fn read_lock(&self) {
        self.sem.acquire(1);
    }

    fn read_unlock(&self) {
        // Releasing one unit of the writer's weight would admit a queued
        // reader next to the writer.
        lock_misuse!(
            !self.writer.load(Ordering::Acquire),
            "WeightedSemaphoreLock",
            "read_unlock while a writer holds the lock"
        );
        self.sem.release(1);
    }

    fn write_lock(&self) {
        self.sem.acquire(self.capacity());
        self.writer.store(true, Ordering::Release);
    }

    fn write_unlock(&self) {
        let was_writer = self.writer.swap(false, Ordering::AcqRel);
        lock_misuse!(was_writer, "WeightedSemaphoreLock", "write_unlock of unlocked lock");
        self.sem.release(self.capacity());
    }

    fn traits(&self) -> LockTraits {
        LockTraits::BLOCKING
            | LockTraits::FIFO_QUEUE
            | LockTraits::WRITER_PREFERRING
            | LockTraits::CANCELLABLE
    }

    fn is_idle(&self) -> bool {
        self.sem.held() == 0 && self.sem.waiters() == 0 && !self.is_write_locked()
    }
}

#[cfg(all(test, not(any(loom, shuttle))))]
mod tests {
    use super::*;
    use crate::testing;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn readers_share_writer_excludes() {
        let lock = WeightedSemaphoreLock::new();
        lock.read_lock();
        lock.read_lock();
        assert_eq!(lock.try_write_lock(), Err(AcquireError::WouldBlock));
        lock.read_unlock();
        lock.read_unlock();
        assert_eq!(lock.try_write_lock(), Ok(()));
        assert_eq!(lock.try_read_lock(), Err(AcquireError::WouldBlock));
        lock.write_unlock();
        assert!(lock.is_idle());
    }

    #[test]
    fn write_timeout_leaves_state_untouched() {
        let lock = WeightedSemaphoreLock::new();
        lock.read_lock();
        assert_eq!(
            lock.write_lock_timeout(Duration::from_millis(20)),
            Err(AcquireError::TimedOut)
        );
        // The failed writer left no trace in the queue: readers still enter.
        assert_eq!(lock.try_read_lock(), Ok(()));
        lock.read_unlock();
        lock.read_unlock();
        assert!(lock.is_idle());
    }

    #[test]
    fn read_timeout_while_writer_holds() {
        let lock = Arc::new(WeightedSemaphoreLock::new());
        lock.write_lock();
        let l2 = Arc::clone(&lock);
        let result = thread::spawn(move || l2.read_lock_timeout(Duration::from_millis(20)))
            .join()
            .unwrap();
        assert_eq!(result, Err(AcquireError::TimedOut));
        lock.write_unlock();
        assert!(lock.is_idle());
    }

    #[test]
    fn capacity_bounds_readers() {
        let lock = WeightedSemaphoreLock::with_capacity(2);
        lock.read_lock();
        lock.read_lock();
        assert_eq!(lock.try_read_lock(), Err(AcquireError::WouldBlock));
        lock.read_unlock();
        lock.read_unlock();
    }

    #[test]
    #[should_panic(expected = "WeightedSemaphore: released 1 units but only 0 held")]
    fn read_unlock_without_lock_panics() {
        WeightedSemaphoreLock::new().read_unlock();
    }

    #[test]
    #[should_panic(expected = "WeightedSemaphoreLock: write_unlock of unlocked lock")]
    fn write_unlock_without_lock_panics() {
        WeightedSemaphoreLock::new().write_unlock();
    }

    #[test]
    #[should_panic(expected = "WeightedSemaphoreLock: write_unlock of unlocked lock")]
    fn write_unlock_by_full_house_of_readers_panics() {
        let lock = WeightedSemaphoreLock::with_capacity(2);
        lock.read_lock();
        lock.read_lock();
        lock.write_unlock();
    }

    #[test]
    #[should_panic(expected = "WeightedSemaphoreLock: read_unlock while a writer holds the lock")]
    fn read_unlock_under_writer_panics() {
        let lock = WeightedSemaphoreLock::new();
        lock.write_lock();
        lock.read_unlock();
    }

    #[test]
    fn read_unlock_under_writer_admits_nobody() {
        let lock = Arc::new(WeightedSemaphoreLock::new());
        lock.write_lock();

        let admitted = Arc::new(AtomicBool::new(false));
        let reader = {
            let lock = Arc::clone(&lock);
            let admitted = Arc::clone(&admitted);
            thread::spawn(move || {
                lock.read_lock();
                admitted.store(true, Ordering::SeqCst);
                lock.read_unlock();
            })
        };
        while lock.sem.waiters() == 0 {
            thread::yield_now();
        }

        let l2 = Arc::clone(&lock);
        assert!(thread::spawn(move || l2.read_unlock()).join().is_err());
        thread::sleep(Duration::from_millis(20));
        assert!(!admitted.load(Ordering::SeqCst), "reader admitted next to the writer");
        assert_eq!(lock.sem.held(), lock.capacity());

        lock.write_unlock();
        reader.join().unwrap();
        assert!(admitted.load(Ordering::SeqCst));
        assert!(lock.is_idle());
    }

    #[test]
    fn unbounded_timeouts() {
        let lock = WeightedSemaphoreLock::new();
        assert_eq!(lock.read_lock_timeout(Duration::MAX), Ok(()));
        lock.read_unlock();
        assert_eq!(lock.write_lock_timeout(Duration::MAX), Ok(()));
        assert!(lock.is_write_locked());
        lock.write_unlock();
        assert!(lock.is_idle());
    }

    #[test]
    fn try_and_timed_write_set_ownership() {
        let lock = WeightedSemaphoreLock::new();
        assert_eq!(lock.try_write_lock(), Ok(()));
        assert!(lock.is_write_locked());
        lock.write_unlock();
        assert_eq!(lock.write_lock_timeout(Duration::from_millis(20)), Ok(()));
        assert!(lock.is_write_locked());
        lock.write_unlock();
        assert!(lock.is_idle());
    }

    #[test]
    fn scenarios() {
        testing::run_common_scenarios(WeightedSemaphoreLock::new);
    }

    #[test]
    fn writer_preference() {
        testing::writer_blocks_later_readers(WeightedSemaphoreLock::new);
    }
}
