//! Data-owning reader-writer lock with RAII guards.
//!
//! [`RwLock`] pairs a value with any [`RawRwLock`] and hands out guards
//! that release the lock on drop, on every exit path including unwinding.

use core::cell::UnsafeCell;
use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::raw::RawRwLock;

/// A reader-writer lock protecting a `T` with the algorithm `R`.
///
/// The algorithm is chosen once, at construction, and stays for the
/// lifetime of the value.
///
/// # Example
///
/// ```ignore
/// let counter = RwLock::new(FastAtomicLock::new(), 0u64);
/// *counter.write() += 1;
/// assert_eq!(*counter.read(), 1);
/// ```
pub struct RwLock<T, R> {
    raw: R,
    data: UnsafeCell<T>,
}

// SAFETY: The RwLock ensures that `T` is either accessed by multiple shared
// readers (requiring `T: Sync`) or by a single exclusive writer (requiring
// `T: Send`).
unsafe impl<T: Send, R: RawRwLock> Send for RwLock<T, R> {}
unsafe impl<T: Send + Sync, R: RawRwLock> Sync for RwLock<T, R> {}

impl<T, R: RawRwLock> RwLock<T, R> {
    /// Creates a new `RwLock` guarding `value` with the lock `raw`.
    pub fn new(raw: R, value: T) -> Self {
        Self {
            raw,
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires shared access, blocking until no writer holds the lock.
    pub fn read(&self) -> RwLockReadGuard<'_, T, R> {
        self.raw.read_lock();
        RwLockReadGuard { lock: self }
    }

    /// Acquires exclusive access, blocking until no reader or writer holds
    /// the lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, T, R> {
        self.raw.write_lock();
        RwLockWriteGuard { lock: self }
    }

    /// Returns the underlying lock.
    pub fn raw(&self) -> &R {
        &self.raw
    }

    /// Returns a mutable reference to the value.
    ///
    /// No locking is needed: the `&mut self` borrow proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Consumes the lock and returns the value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: fmt::Debug, R: RawRwLock> fmt::Debug for RwLock<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.read();
        f.debug_struct("RwLock").field("data", &&*guard).finish()
    }
}

/// RAII guard for shared access to an [`RwLock`].
pub struct RwLockReadGuard<'a, T, R: RawRwLock> {
    lock: &'a RwLock<T, R>,
}

impl<T, R: RawRwLock> Deref for RwLockReadGuard<'_, T, R> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Read lock is held: no writer can exist.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T, R: RawRwLock> Drop for RwLockReadGuard<'_, T, R> {
    fn drop(&mut self) {
        self.lock.raw.read_unlock();
    }
}

/// RAII guard for exclusive access to an [`RwLock`].
pub struct RwLockWriteGuard<'a, T, R: RawRwLock> {
    lock: &'a RwLock<T, R>,
}

impl<T, R: RawRwLock> Deref for RwLockWriteGuard<'_, T, R> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Write lock is held: no other reader or writer can exist.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T, R: RawRwLock> DerefMut for RwLockWriteGuard<'_, T, R> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Write lock is held: no other reader or writer can exist.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T, R: RawRwLock> Drop for RwLockWriteGuard<'_, T, R> {
    fn drop(&mut self) {
        self.lock.raw.write_unlock();
    }
}
