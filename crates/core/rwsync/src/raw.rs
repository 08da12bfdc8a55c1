//! The reader-writer capability set shared by every lock in the catalog.

use std::sync::Arc;

bitflags::bitflags! {
    /// Static description of a lock algorithm's tradeoffs.
    ///
    /// Reported by [`RawRwLock::traits`] so that callers (and the benchmark
    /// harness) can pick a variant by property instead of by name.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LockTraits: u8 {
        /// Waiters sleep instead of burning CPU while blocked.
        const BLOCKING = 1 << 0;
        /// Once a writer announces intent, later readers queue behind it.
        const WRITER_PREFERRING = 1 << 1;
        /// Waiters are served in arrival order.
        const FIFO_QUEUE = 1 << 2;
        /// Acquisition can give up (try / timeout) and report failure.
        const CANCELLABLE = 1 << 3;
        /// An uncontended read is a single atomic read-modify-write.
        const ATOMIC_READ_FAST_PATH = 1 << 4;
    }
}

/// A raw reader-writer lock: shared access for readers, exclusive access
/// for a single writer, never both.
///
/// The lock guards no data itself. Callers bracket every access to the
/// protected resource with a matching lock/unlock pair, usually through
/// [`RwLock`](crate::RwLock) which does the pairing with RAII guards.
///
/// None of the locks are reentrant: a thread that calls
/// [`write_lock`](Self::write_lock) twice without unlocking deadlocks.
///
/// # Panics
///
/// [`read_unlock`](Self::read_unlock) and [`write_unlock`](Self::write_unlock)
/// panic when called without a matching acquisition.
pub trait RawRwLock: Send + Sync {
    /// Blocks until shared access is granted.
    fn read_lock(&self);

    /// Releases one unit of shared access.
    fn read_unlock(&self);

    /// Blocks until exclusive access is granted.
    fn write_lock(&self);

    /// Releases exclusive access.
    fn write_unlock(&self);

    /// Returns the tradeoffs this algorithm makes.
    fn traits(&self) -> LockTraits;

    /// Returns `true` if no reader or writer holds the lock or waits for it.
    ///
    /// Only meaningful when the caller knows no other thread is in the
    /// middle of an operation; intended for tests and quiescent checks.
    fn is_idle(&self) -> bool;
}

macro_rules! forward_raw_rwlock {
    ($($ty:ty),+) => {
        $(
            impl<L: RawRwLock + ?Sized> RawRwLock for $ty {
                #[inline]
                fn read_lock(&self) {
                    (**self).read_lock();
                }

                #[inline]
                fn read_unlock(&self) {
                    (**self).read_unlock();
                }

                #[inline]
                fn write_lock(&self) {
                    (**self).write_lock();
                }

                #[inline]
                fn write_unlock(&self) {
                    (**self).write_unlock();
                }

                fn traits(&self) -> LockTraits {
                    (**self).traits()
                }

                fn is_idle(&self) -> bool {
                    (**self).is_idle()
                }
            }
        )+
    };
}

forward_raw_rwlock!(&L, Box<L>, Arc<L>);
