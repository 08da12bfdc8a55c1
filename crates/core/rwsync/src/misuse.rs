//! Fatal lock-misuse checks.
//!
//! The [`lock_misuse!`] macro guards the invariants that a caller breaks by
//! releasing a lock it never acquired. Once such an unlock has happened the
//! internal counters no longer describe reality, so there is nothing to
//! recover: the check panics.
//!
//! # Behavior
//!
//! | Build configuration | Result |
//! |---------------------|--------|
//! | Debug | Panics on failure |
//! | Release | Panics on failure |
//!
//! Unlike a `debug_assert!`, the check is never compiled away. An unmatched
//! unlock that went unnoticed in release builds would let a writer and a
//! reader into the critical section together.

/// Panics with a lock-misuse message when `$cond` is false.
///
/// The first argument names the lock type so that the message reads
/// `"<lock>: <what went wrong>"`.
///
/// # Examples
///
/// ```ignore
/// lock_misuse!(state.readers > 0, "CondCounterLock", "read_unlock of unlocked lock");
/// lock_misuse!(held, "SpinMutex", "unlock of unlocked mutex ({} waiters)", waiters);
/// ```
macro_rules! lock_misuse {
    ($cond:expr, $lock:expr, $msg:literal $(,)?) => {
        if !$cond {
            panic!(concat!("{}: ", $msg), $lock);
        }
    };
    ($cond:expr, $lock:expr, $fmt:literal, $($arg:tt)+) => {
        if !$cond {
            panic!(concat!("{}: ", $fmt), $lock, $($arg)+);
        }
    };
}
