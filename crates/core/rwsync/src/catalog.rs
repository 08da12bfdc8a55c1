//! Selecting a lock algorithm at construction time.

use core::fmt;
use core::str::FromStr;

use crate::raw::{LockTraits, RawRwLock};
use crate::{
    CondCounterLock, FastAtomicLock, SpinCounterLock, WeightedSemaphoreLock, WriterPreferringLock,
};

/// The lock algorithms in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKind {
    /// [`SpinCounterLock`].
    SpinCounter,
    /// [`CondCounterLock`].
    CondCounter,
    /// [`WeightedSemaphoreLock`].
    WeightedSemaphore,
    /// [`WriterPreferringLock`].
    WriterPreferring,
    /// [`FastAtomicLock`].
    FastAtomic,
}

impl LockKind {
    /// Every algorithm, simplest first.
    pub const ALL: [LockKind; 5] = [
        Self::SpinCounter,
        Self::CondCounter,
        Self::WeightedSemaphore,
        Self::WriterPreferring,
        Self::FastAtomic,
    ];

    /// Returns the kebab-case name used on command lines and in reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SpinCounter => "spin-counter",
            Self::CondCounter => "cond-counter",
            Self::WeightedSemaphore => "weighted-semaphore",
            Self::WriterPreferring => "writer-preferring",
            Self::FastAtomic => "fast-atomic",
        }
    }

    /// Returns the tradeoffs of this algorithm without building a lock.
    pub fn traits(self) -> LockTraits {
        match self {
            Self::SpinCounter => LockTraits::empty(),
            Self::CondCounter => LockTraits::BLOCKING,
            Self::WeightedSemaphore => {
                LockTraits::BLOCKING
                    | LockTraits::FIFO_QUEUE
                    | LockTraits::WRITER_PREFERRING
                    | LockTraits::CANCELLABLE
            }
            Self::WriterPreferring => LockTraits::BLOCKING | LockTraits::WRITER_PREFERRING,
            Self::FastAtomic => {
                LockTraits::BLOCKING
                    | LockTraits::WRITER_PREFERRING
                    | LockTraits::ATOMIC_READ_FAST_PATH
            }
        }
    }

    /// Builds a new, unlocked instance of this algorithm.
    pub fn build(self) -> Box<dyn RawRwLock> {
        match self {
            Self::SpinCounter => Box::new(SpinCounterLock::new()),
            Self::CondCounter => Box::new(CondCounterLock::new()),
            Self::WeightedSemaphore => Box::new(WeightedSemaphoreLock::new()),
            Self::WriterPreferring => Box::new(WriterPreferringLock::new()),
            Self::FastAtomic => Box::new(FastAtomicLock::new()),
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown [`LockKind`] name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLockKind(pub String);

impl fmt::Display for UnknownLockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lock kind `{}` (expected one of: ", self.0)?;
        for (i, kind) in LockKind::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(kind.name())?;
        }
        f.write_str(")")
    }
}

impl std::error::Error for UnknownLockKind {}

impl FromStr for LockKind {
    type Err = UnknownLockKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLockKind(s.to_owned()))
    }
}
