//! Unbuffered rendezvous channel carrying wake-up tokens.
//!
//! [`Handoff`] blocks exactly one waiter per token: every [`send`] returns
//! only after exactly one [`recv`] has consumed its token, and a token is
//! never consumed twice. [`FastAtomicLock`](crate::FastAtomicLock) parks
//! readers and its writer on two of these.
//!
//! [`send`]: Handoff::send
//! [`recv`]: Handoff::recv

use crate::compat::{self, Condvar, Mutex};

/// Token counters. `sent - received` is 0 or 1: at most one token is in
/// flight at any time.
struct Tokens {
    sent: u64,
    received: u64,
}

/// A capacity-one rendezvous point.
pub struct Handoff {
    tokens: Mutex<Tokens>,
    changed: Condvar,
}

impl Handoff {
    /// Creates an empty hand-off channel.
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(Tokens {
                sent: 0,
                received: 0,
            }),
            changed: Condvar::new(),
        }
    }

    /// Offers one token and blocks until a receiver has taken it.
    pub fn send(&self) {
        let mut tokens = compat::lock(&self.tokens);
        // Wait for the slot to empty.
        while tokens.sent != tokens.received {
            tokens = compat::wait(&self.changed, tokens);
        }
        tokens.sent += 1;
        let ticket = tokens.sent;
        self.changed.notify_all();
        // Rendezvous: wait until our token is consumed.
        while tokens.received < ticket {
            tokens = compat::wait(&self.changed, tokens);
        }
    }

    /// Blocks until a token is offered, then consumes it.
    pub fn recv(&self) {
        let mut tokens = compat::lock(&self.tokens);
        while tokens.sent == tokens.received {
            tokens = compat::wait(&self.changed, tokens);
        }
        tokens.received += 1;
        self.changed.notify_all();
    }

    /// Returns `true` if a token is offered but not yet consumed.
    pub fn is_pending(&self) -> bool {
        let tokens = compat::lock(&self.tokens);
        tokens.sent != tokens.received
    }
}

impl Default for Handoff {
    fn default() -> Self {
        Self::new()
    }
}
