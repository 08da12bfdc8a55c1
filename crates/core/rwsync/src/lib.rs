//! A catalog of reader-writer lock algorithms.
//!
//! Five independent implementations of one capability set, [`RawRwLock`]
//! (`read_lock`, `read_unlock`, `write_lock`, `write_unlock`), each making
//! a different throughput/fairness tradeoff:
//!
//! | Lock | Waiting | Writer starvation |
//! |------|---------|-------------------|
//! | [`SpinCounterLock`] | writer busy-polls | possible |
//! | [`CondCounterLock`] | condition variable | possible |
//! | [`WeightedSemaphoreLock`] | FIFO semaphore queue | no (FIFO) |
//! | [`WriterPreferringLock`] | condition variable + pending flag | no |
//! | [`FastAtomicLock`] | hand-off channels, atomic read fast path | no |
//!
//! A caller picks one at construction, directly or through [`LockKind`],
//! and usually wraps it in [`RwLock`] to get RAII guards. Unlocking a lock
//! that is not held panics in every variant.
//!
//! All atomics and monitors go through an internal shim so the algorithms
//! can be checked with loom (`--cfg loom`) and shuttle (`--cfg shuttle`)
//! as well as on real threads.

#![warn(missing_docs)]

#[macro_use]
mod misuse;

mod catalog;
mod compat;
mod cond_counter;
mod fast;
mod guard;
mod handoff;
mod mutex;
mod raw;
mod semaphore;
mod semaphore_lock;
mod spin_counter;
pub mod stress;
mod writer_pref;

#[cfg(all(test, not(any(loom, shuttle))))]
mod testing;



pub use catalog::{LockKind, UnknownLockKind};
pub use cond_counter::CondCounterLock;
pub use fast::{FastAtomicLock, MAX_READERS};
pub use guard::{RwLock, RwLockReadGuard, RwLockWriteGuard};
pub use handoff::Handoff;
pub use mutex::{BlockingMutex, SpinMutex};
pub use raw::{LockTraits, RawRwLock};
pub use semaphore::{AcquireError, WeightedSemaphore};
pub use semaphore_lock::{MAX_WEIGHT, WeightedSemaphoreLock};
pub use spin_counter::SpinCounterLock;
pub use writer_pref::WriterPreferringLock;
