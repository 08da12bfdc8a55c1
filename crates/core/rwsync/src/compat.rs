//! Model-checker compatibility shim.
//!
//! When compiled with `cfg(loom)`, re-exports loom's concurrency primitives.
//! When compiled with `cfg(shuttle)`, re-exports shuttle's. Otherwise,
//! re-exports the standard library types.
//!
//! Every lock in this crate reaches its atomics, monitors, and threads
//! through this module so the same code runs under loom's exhaustive
//! scheduler, shuttle's randomized scheduler, and real OS threads.

// ---------------------------------------------------------------------------
// Loom mode
// ---------------------------------------------------------------------------

#[cfg(loom)]
#[allow(unused_imports)]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
#[cfg(loom)]
#[allow(unused_imports)]
pub(crate) use loom::sync::{Arc, Condvar, Mutex, MutexGuard};
#[cfg(loom)]
pub(crate) use loom::thread;

// ---------------------------------------------------------------------------
// Shuttle mode
// ---------------------------------------------------------------------------

#[cfg(all(shuttle, not(loom)))]
#[allow(unused_imports)]
pub(crate) use shuttle::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
#[cfg(all(shuttle, not(loom)))]
#[allow(unused_imports)]
pub(crate) use shuttle::sync::{Arc, Condvar, Mutex, MutexGuard};
#[cfg(all(shuttle, not(loom)))]
pub(crate) use shuttle::thread;

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

#[cfg(not(any(loom, shuttle)))]
#[allow(unused_imports)]
pub(crate) use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
#[cfg(not(any(loom, shuttle)))]
#[allow(unused_imports)]
pub(crate) use std::sync::{Arc, Condvar, Mutex, MutexGuard};
#[cfg(not(any(loom, shuttle)))]
#[allow(unused_imports)]
pub(crate) use std::thread;

/// Acquires `mutex`, ignoring poisoning.
///
/// Misuse panics fire before bookkeeping is touched, so a poisoned monitor
/// still holds consistent state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Waits on `cond`, ignoring poisoning.
pub(crate) fn wait<'a, T>(cond: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    cond.wait(guard)
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Waits on `cond` for at most `dur`, ignoring poisoning.
///
/// Callers must re-check their own deadline: the result does not say
/// whether the wait timed out. Model checkers do not model time, so under
/// loom and shuttle this is an untimed wait.
pub(crate) fn wait_timeout<'a, T>(
    cond: &Condvar,
    guard: MutexGuard<'a, T>,
    dur: std::time::Duration,
) -> MutexGuard<'a, T> {
    #[cfg(any(loom, shuttle))]
    {
        let _ = dur;
        wait(cond, guard)
    }
    #[cfg(not(any(loom, shuttle)))]
    {
        match cond.wait_timeout(guard, dur) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}

/// One iteration of a busy-wait loop.
///
/// Model checkers cannot make progress through a pure spin, so under loom
/// and shuttle this yields to the scheduler instead.
#[inline]
pub(crate) fn relax() {
    #[cfg(any(loom, shuttle))]
    thread::yield_now();
    #[cfg(not(any(loom, shuttle)))]
    core::hint::spin_loop();
}
