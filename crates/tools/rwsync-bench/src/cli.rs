//! Command-line interface definitions for rwsync-bench.

use clap::Parser;
use rwsync::LockKind;

/// Read/write throughput and latency harness for the rwsync lock catalog.
#[derive(Parser, Debug)]
#[command(name = "rwsync-bench", version, about)]
pub struct Cli {
    /// Lock algorithm to measure (repeatable). Omit to measure all of them.
    #[arg(long = "lock", short = 'l')]
    pub locks: Vec<LockKind>,

    /// Number of worker threads.
    #[arg(long, short = 't', default_value_t = 4)]
    pub threads: usize,

    /// Operations per worker thread.
    #[arg(long, short = 'n', default_value_t = 10_000)]
    pub ops: usize,

    /// Percentage of operations that take the write lock (0-100).
    #[arg(long, short = 'w', default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub write_percent: u8,

    /// Microseconds to stay inside each critical section.
    #[arg(long, default_value_t = 0)]
    pub hold_us: u64,

    /// Maximum random stress delay in microseconds (needs cfg(rwsync_stress)).
    #[arg(long, default_value_t = 0)]
    pub stress_max_us: u32,

    /// PRNG seed for the operation mix and stress delays.
    #[arg(long, default_value_t = 0x5EED)]
    pub seed: u64,

    /// Suppress everything but the result table and errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Returns the selected lock kinds, defaulting to the whole catalog.
    pub fn selected_locks(&self) -> Vec<LockKind> {
        if self.locks.is_empty() {
            LockKind::ALL.to_vec()
        } else {
            self.locks.clone()
        }
    }

    /// Maps `-q` / `-v` to a log level filter.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
