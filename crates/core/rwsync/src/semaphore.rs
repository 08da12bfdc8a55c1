//! Weighted counting semaphore with FIFO admission.
//!
//! [`WeightedSemaphore`] hands out units of a fixed capacity. Callers ask
//! for any weight up to the capacity; a request that does not fit queues
//! behind every earlier request, including smaller ones that would fit.
//! That strict ordering is what keeps a full-capacity request (a writer in
//! [`WeightedSemaphoreLock`](crate::WeightedSemaphoreLock)) from being
//! starved by a stream of weight-1 requests.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use crate::compat::{self, Condvar, Mutex, MutexGuard};
use crate::stress;

/// Why a non-blocking or timed acquisition did not obtain its weight.
///
/// When an acquisition fails, the caller holds nothing and the semaphore
/// is left as if the caller had never arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The weight was not immediately available.
    WouldBlock,
    /// The deadline passed before the weight became available.
    TimedOut,
    /// The request can never be satisfied.
    ExceedsCapacity {
        /// Weight asked for.
        requested: u64,
        /// Total capacity of the semaphore.
        capacity: u64,
    },
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WouldBlock => write!(f, "acquire would block"),
            Self::TimedOut => write!(f, "acquire timed out"),
            Self::ExceedsCapacity {
                requested,
                capacity,
            } => write!(f, "requested weight {requested} exceeds capacity {capacity}"),
        }
    }
}

impl std::error::Error for AcquireError {}

/// A queued request.
struct Waiter {
    ticket: u64,
    weight: u64,
}

struct State {
    /// Weight currently held.
    held: u64,
    /// Waiters in arrival order. Tickets increase front to back.
    queue: VecDeque<Waiter>,
    next_ticket: u64,
}

impl State {
    /// Whether the waiter holding `ticket` has been granted its weight.
    ///
    /// Granting pops from the front in ticket order and a cancelled waiter
    /// only removes itself, so every ticket below the current front has
    /// been served.
    fn is_granted(&self, ticket: u64) -> bool {
        self.queue.front().is_none_or(|w| w.ticket > ticket)
    }
}

/// A weighted semaphore.
pub struct WeightedSemaphore {
    capacity: u64,
    state: Mutex<State>,
    granted: Condvar,
}

impl WeightedSemaphore {
    /// Creates a semaphore with `capacity` units, all available.
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            state: Mutex::new(State {
                held: 0,
                queue: VecDeque::new(),
                next_ticket: 0,
            }),
            granted: Condvar::new(),
        }
    }

    /// Returns the total capacity.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the weight currently held by all callers.
    pub fn held(&self) -> u64 {
        compat::lock(&self.state).held
    }

    /// Returns the number of callers queued for weight.
    pub fn waiters(&self) -> usize {
        compat::lock(&self.state).queue.len()
    }

    /// Acquires `n` units, blocking until they are available.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the capacity: such a request could never be
    /// granted and would block forever.
    pub fn acquire(&self, n: u64) {
        lock_misuse!(
            n <= self.capacity,
            "WeightedSemaphore",
            "acquire of {} units exceeds capacity {}",
            n,
            self.capacity
        );
        stress::point();
        let mut state = compat::lock(&self.state);
        if self.fits_now(&state, n) {
            state.held += n;
            return;
        }
        let ticket = Self::enqueue(&mut state, n);
        while !state.is_granted(ticket) {
            state = compat::wait(&self.granted, state);
        }
    }

    /// Acquires `n` units only if they are available right now and nobody
    /// is queued ahead.
    pub fn try_acquire(&self, n: u64) -> Result<(), AcquireError> {
        self.check_capacity(n)?;
        let mut state = compat::lock(&self.state);
        if self.fits_now(&state, n) {
            state.held += n;
            Ok(())
        } else {
            Err(AcquireError::WouldBlock)
        }
    }

    /// Acquires `n` units, giving up after `timeout`.
    pub fn acquire_timeout(&self, n: u64, timeout: Duration) -> Result<(), AcquireError> {
        self.check_capacity(n)?;
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            // Too far out to represent: no deadline at all.
            self.acquire(n);
            return Ok(());
        };
        stress::point();

        let mut state = compat::lock(&self.state);
        if self.fits_now(&state, n) {
            state.held += n;
            return Ok(());
        }
        let ticket = Self::enqueue(&mut state, n);
        loop {
            if state.is_granted(ticket) {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                self.cancel(state, ticket);
                log::debug!("WeightedSemaphore: acquire of {n} units timed out after {timeout:?}");
                return Err(AcquireError::TimedOut);
            }
            state = compat::wait_timeout(&self.granted, state, deadline - now);
        }
    }

    /// Releases `n` units and admits as many queued waiters as now fit.
    ///
    /// # Panics
    ///
    /// Panics if more units are released than are held.
    pub fn release(&self, n: u64) {
        let mut state = compat::lock(&self.state);
        let held = state.held;
        let ok = n <= held;
        if ok {
            state.held -= n;
            self.admit(&mut state);
        }
        drop(state);
        lock_misuse!(
            ok,
            "WeightedSemaphore",
            "released {} units but only {} held",
            n,
            held
        );
        stress::point();
    }

    fn check_capacity(&self, n: u64) -> Result<(), AcquireError> {
        if n > self.capacity {
            Err(AcquireError::ExceedsCapacity {
                requested: n,
                capacity: self.capacity,
            })
        } else {
            Ok(())
        }
    }

    /// A request may skip the queue only when nobody is waiting.
    fn fits_now(&self, state: &State, n: u64) -> bool {
        state.queue.is_empty() && self.capacity - state.held >= n
    }

    fn enqueue(state: &mut State, weight: u64) -> u64 {
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.queue.push_back(Waiter { ticket, weight });
        log::trace!(
            "WeightedSemaphore: queued weight {weight} behind {} waiters",
            state.queue.len() - 1
        );
        ticket
    }

    /// Grants weight to waiters at the front of the queue, in order, until
    /// the first one that does not fit.
    fn admit(&self, state: &mut State) {
        let mut woke = false;
        while let Some(front) = state.queue.front() {
            if self.capacity - state.held < front.weight {
                break;
            }
            state.held += front.weight;
            state.queue.pop_front();
            woke = true;
        }
        if woke {
            self.granted.notify_all();
        }
    }

    /// Withdraws `ticket` from the queue after a timeout.
    fn cancel(&self, mut state: MutexGuard<'_, State>, ticket: u64) {
        let was_front = state.queue.front().is_some_and(|w| w.ticket == ticket);
        state.queue.retain(|w| w.ticket != ticket);
        // A large head that gave up may have been blocking smaller waiters.
        if was_front {
            self.admit(&mut state);
        }
    }
}
