//! Lock contention stress delays.
//!
//! Injects random spin delays at lock entry and exit points to widen race
//! windows and surface timing-dependent bugs in the lock algorithms. The
//! injection points compile to nothing unless the crate is built with
//! `--cfg rwsync_stress`.
//!
//! ## Design
//!
//! - **PRNG**: xorshift64 with per-thread state, no locking.
//! - **Timing**: `std::time::Instant`.
//! - **Delay**: spins for a random duration in `[0, max_us)` microseconds.
//!   Until [`init`] is called the maximum is zero and every point is a no-op.

#[cfg(rwsync_stress)]
use std::cell::Cell;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Maximum stress delay in microseconds. Zero disables delays.
static MAX_US: AtomicU32 = AtomicU32::new(0);

/// Base seed. Each thread derives its own stream from it.
static SEED: AtomicU64 = AtomicU64::new(FALLBACK_SEED);

/// Seed used when the caller passes zero (xorshift's fixed point).
const FALLBACK_SEED: u64 = 0xDEAD_BEEF_CAFE_BABE;

/// Distinguishes per-thread streams.
#[cfg(rwsync_stress)]
static NEXT_STREAM: AtomicU64 = AtomicU64::new(1);

#[cfg(rwsync_stress)]
thread_local! {
    static PRNG_STATE: Cell<u64> = const { Cell::new(0) };
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

/// Configures the stress delays.
///
/// - `max_us`: maximum random delay in microseconds. Zero disables delays.
/// - `seed`: base PRNG seed. If 0, a fallback constant is used to avoid a
///   stuck-at-zero xorshift.
///
/// Threads that already drew a random number keep their stream; threads
/// created afterwards derive theirs from the new seed.
pub fn init(max_us: u32, seed: u64) {
    let base = if seed == 0 { FALLBACK_SEED } else { seed };
    SEED.store(base, Ordering::Relaxed);
    MAX_US.store(max_us, Ordering::Relaxed);

    if is_compiled_in() {
        log::info!("rwsync: lock stress enabled, max delay {max_us}us, seed {base:#x}");
    } else if max_us != 0 {
        log::warn!("rwsync: stress delays requested but crate was built without cfg(rwsync_stress)");
    }
}

/// Returns `true` if injection points were compiled in.
pub const fn is_compiled_in() -> bool {
    cfg!(rwsync_stress)
}

/// Returns the configured maximum delay in microseconds.
pub fn max_us() -> u32 {
    MAX_US.load(Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// PRNG
// ---------------------------------------------------------------------------

/// Advances a xorshift64 state and returns the new value.
///
/// `x` must be non-zero; zero is a fixed point.
#[inline]
pub fn xorshift64(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

/// Derives a non-zero per-stream seed from a base seed.
pub fn stream_seed(base: u64, stream: u64) -> u64 {
    let seed = base
        .wrapping_add(stream)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15);
    // Avoid zero (xorshift fixed point).
    if seed == 0 { base ^ 0x1234_5678 } else { seed }
}

/// Returns the next pseudo-random u64 for the current thread.
#[cfg(rwsync_stress)]
#[inline]
fn next_random() -> u64 {
    PRNG_STATE.with(|state| {
        let mut x = state.get();
        if x == 0 {
            let stream = NEXT_STREAM.fetch_add(1, Ordering::Relaxed);
            x = stream_seed(SEED.load(Ordering::Relaxed), stream);
        }
        x = xorshift64(x);
        state.set(x);
        x
    })
}

// ---------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------

/// Marks a lock entry or exit point.
///
/// Compiles to nothing without `cfg(rwsync_stress)`. With it, spins for a
/// random duration in `[0, max_us)` microseconds.
///
/// This function must not acquire any lock from this crate (it is called
/// from their acquire and release paths).
#[inline]
pub(crate) fn point() {
    #[cfg(rwsync_stress)]
    stress_delay();
}

#[cfg(rwsync_stress)]
fn stress_delay() {
    let max_us = MAX_US.load(Ordering::Relaxed);
    if max_us == 0 {
        return;
    }

    let target_ns = next_random() % (u64::from(max_us) * 1000);
    if target_ns == 0 {
        return;
    }

    // Under a model checker time does not advance; yield instead.
    #[cfg(any(loom, shuttle))]
    {
        crate::compat::thread::yield_now();
    }

    #[cfg(not(any(loom, shuttle)))]
    {
        let start = std::time::Instant::now();
        let target = std::time::Duration::from_nanos(target_ns);
        while start.elapsed() < target {
            core::hint::spin_loop();
        }
    }
}
