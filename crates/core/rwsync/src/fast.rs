//! Atomic fast-path reader-writer lock with hand-off wakeups.
//!
//! The design of a high-performance standard-library `RWMutex`: one mutex
//! serializes writers, two `i32` atomics carry all reader bookkeeping, and
//! two rendezvous channels park whoever has to wait.
//!
//! ## Counter encoding
//!
//! `pending` counts readers that are inside or queued. A writer announces
//! itself by subtracting [`MAX_READERS`], which makes the counter negative
//! while keeping the reader count recoverable as `pending + MAX_READERS`:
//!
//! | `pending`                    | Meaning                                    |
//! |------------------------------|--------------------------------------------|
//! | `0`                          | unlocked                                   |
//! | `n > 0`                      | `n` readers inside, no writer              |
//! | `-MAX_READERS`               | writer inside, nobody waiting              |
//! | `-MAX_READERS + k`, `k > 0`  | writer waiting or inside, `k` readers inside or parked |
//!
//! `departing` counts readers that were already inside when the writer
//! announced itself. The writer sleeps until it drains to zero.
//!
//! ## Transitions
//!
//! 1. **Reader enters, uncontended.** `pending` goes from `n >= 0` to
//!    `n + 1 > 0`. One atomic add; nothing else.
//! 2. **Reader enters, contended.** `pending` was negative, so the add
//!    leaves it negative. The reader parks on `reader_wait` until the
//!    writer's unlock hands it a token.
//! 3. **Writer enters, no readers.** The subtraction observes `r = 0`
//!    readers in flight. The writer owns the lock immediately.
//! 4. **Writer enters, readers draining.** The subtraction observes
//!    `r > 0`. The writer adds `r` to `departing` and parks on
//!    `writer_wait`. Each of those readers, on unlock, sees a negative
//!    `pending` and decrements `departing`; the one that takes it to zero
//!    hands the writer its token.
//!
//! A writer may also find `departing` already at zero after adding `r`:
//! the readers left between its subtraction and its add and drove the
//! counter negative first. Nobody will send in that case, and the writer
//! must not wait.
//!
//! On unlock the writer adds the bias back. The result is exactly the
//! number of readers that arrived during transition 2 and are parked, and
//! the writer sends each one a token before releasing the writer mutex.

use crate::compat::{AtomicI32, Ordering};
use crate::handoff::Handoff;
use crate::mutex::BlockingMutex;
use crate::raw::{LockTraits, RawRwLock};
use crate::stress;

/// Bias a writer subtracts from `pending`; also the reader limit.
pub const MAX_READERS: i32 = 1 << 30;

/// A writer-preferring lock with a single-atomic read fast path.
///
/// At most [`MAX_READERS`] - 1 readers may hold or wait for the lock at
/// once.
pub struct FastAtomicLock {
    /// Serializes writers against each other.
    writer: BlockingMutex,
    /// Parks the writer until departing readers have left.
    writer_wait: Handoff,
    /// Parks readers that arrived while a writer was pending.
    reader_wait: Handoff,
    /// Readers inside or queued, biased by `-MAX_READERS` while a writer is pending.
    pending: AtomicI32,
    /// Readers the pending writer still has to wait for.
    departing: AtomicI32,
}

impl FastAtomicLock {
    /// Creates a new unlocked `FastAtomicLock`.
    pub fn new() -> Self {
        Self {
            writer: BlockingMutex::new(),
            writer_wait: Handoff::new(),
            reader_wait: Handoff::new(),
            pending: AtomicI32::new(0),
            departing: AtomicI32::new(0),
        }
    }

    /// Returns `true` if a writer has recorded intent or holds the lock.
    pub fn is_writer_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire) < 0
    }

    /// Returns the raw `pending` counter.
    pub fn pending(&self) -> i32 {
        self.pending.load(Ordering::Acquire)
    }

    /// Returns the number of readers the pending writer is waiting for.
    pub fn departing(&self) -> i32 {
        self.departing.load(Ordering::Acquire)
    }

    #[cold]
    fn read_unlock_slow(&self, r: i32) {
        // `r + 1` is the value before our decrement. 0 means nobody held the
        // lock; -MAX_READERS means only a writer did.
        lock_misuse!(
            r + 1 != 0 && r + 1 != -MAX_READERS,
            "FastAtomicLock",
            "read_unlock of unlocked lock"
        );
        // A writer is pending; we were one of the readers it waits for.
        if self.departing.fetch_sub(1, Ordering::AcqRel) - 1 == 0 {
            // Last one out wakes the writer.
            self.writer_wait.send();
        }
    }
}

impl Default for FastAtomicLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawRwLock for FastAtomicLock {
    fn read_lock(&self) {
        stress::point();
        if self.pending.fetch_add(1, Ordering::AcqRel) + 1 < 0 {
            // A writer is pending: wait for it to hand us the lock.
            self.reader_wait.recv();
        }
    }

    fn read_unlock(&self) {
        stress::point();
        let r = self.pending.fetch_sub(1, Ordering::AcqRel) - 1;
        if r < 0 {
            self.read_unlock_slow(r);
        }
    }

    fn write_lock(&self) {
        stress::point();
        // Exclude other writers first.
        self.writer.lock();
        // Announce to readers, and learn how many are in flight.
        let r = self.pending.fetch_sub(MAX_READERS, Ordering::AcqRel);
        if r != 0 && self.departing.fetch_add(r, Ordering::AcqRel) + r != 0 {
            log::trace!("FastAtomicLock: writer waiting for {r} departing readers");
            self.writer_wait.recv();
        }
    }

    fn write_unlock(&self) {
        // Announce to readers there is no active writer.
        let r = self.pending.fetch_add(MAX_READERS, Ordering::AcqRel) + MAX_READERS;
        lock_misuse!(r < MAX_READERS, "FastAtomicLock", "write_unlock of unlocked lock");
        // Release the readers that queued behind us, one token each.
        for _ in 0..r {
            self.reader_wait.send();
        }
        // Allow other writers to proceed.
        self.writer.unlock();
        stress::point();
    }

    fn traits(&self) -> LockTraits {
        LockTraits::BLOCKING | LockTraits::WRITER_PREFERRING | LockTraits::ATOMIC_READ_FAST_PATH
    }

    fn is_idle(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0
            && self.departing.load(Ordering::Acquire) == 0
            && !self.writer.is_locked()
            && !self.reader_wait.is_pending()
            && !self.writer_wait.is_pending()
    }
}
