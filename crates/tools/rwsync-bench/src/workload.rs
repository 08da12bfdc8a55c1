//! Mixed read/write workload driver.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use rwsync::stress::{stream_seed, xorshift64};
use rwsync::{LockKind, RawRwLock, RwLock};

use crate::stats::{self, BenchStats};

/// Workload shape shared by every lock under test.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub threads: usize,
    pub ops: usize,
    pub write_percent: u8,
    pub hold: Duration,
    pub seed: u64,
}

/// Outcome of one lock's run.
#[derive(Debug)]
pub struct Report {
    pub kind: LockKind,
    pub reads: u64,
    pub writes: u64,
    pub elapsed: Duration,
    pub ops_per_sec: u64,
    pub read_latency: Option<BenchStats>,
    pub write_latency: Option<BenchStats>,
}

/// Per-thread tallies returned from a worker.
#[derive(Default)]
struct Samples {
    reads: Vec<u64>,
    writes: Vec<u64>,
}

/// Whether the next operation is a write, given a PRNG draw.
fn is_write(draw: u64, write_percent: u8) -> bool {
    draw % 100 < u64::from(write_percent)
}

/// Stays inside a critical section for `hold`.
fn hold_for(hold: Duration) {
    if hold.is_zero() {
        return;
    }
    let start = Instant::now();
    while start.elapsed() < hold {
        std::hint::spin_loop();
    }
}

fn worker(
    lock: &RwLock<u64, Box<dyn RawRwLock>>,
    start: &Barrier,
    params: Params,
    index: usize,
) -> Samples {
    let mut rng = stream_seed(params.seed, index as u64);
    let mut samples = Samples::default();
    start.wait();

    for _ in 0..params.ops {
        rng = xorshift64(rng);
        let write = is_write(rng, params.write_percent);
        let t0 = Instant::now();
        if write {
            let mut value = lock.write();
            *value += 1;
            hold_for(params.hold);
            drop(value);
            samples.writes.push(t0.elapsed().as_nanos() as u64);
        } else {
            let value = lock.read();
            std::hint::black_box(*value);
            hold_for(params.hold);
            drop(value);
            samples.reads.push(t0.elapsed().as_nanos() as u64);
        }
    }
    samples
}

/// Runs the workload against a fresh lock of `kind` and checks the result.
pub fn run(kind: LockKind, params: Params) -> Result<Report> {
    if params.threads == 0 {
        bail!("at least one worker thread is required");
    }

    let lock = Arc::new(RwLock::new(kind.build(), 0u64));
    let start = Arc::new(Barrier::new(params.threads + 1));

    log::debug!(
        "{kind}: {} threads x {} ops, {}% writes",
        params.threads,
        params.ops,
        params.write_percent
    );

    let handles = (0..params.threads)
        .map(|index| {
            let lock = Arc::clone(&lock);
            let start = Arc::clone(&start);
            thread::Builder::new()
                .name(format!("{kind}-{index}"))
                .spawn(move || worker(&lock, &start, params, index))
                .with_context(|| format!("failed to spawn worker {index} for {kind}"))
        })
        .collect::<Result<Vec<_>>>()?;

    start.wait();
    let began = Instant::now();

    let mut reads = Vec::with_capacity(params.threads * params.ops);
    let mut writes = Vec::new();
    for (index, handle) in handles.into_iter().enumerate() {
        let samples = match handle.join() {
            Ok(samples) => samples,
            Err(_) => bail!("{kind}: worker {index} panicked"),
        };
        reads.extend(samples.reads);
        writes.extend(samples.writes);
    }
    let elapsed = began.elapsed();

    let counter = *lock.read();
    let expected = writes.len() as u64;
    if counter != expected {
        bail!("{kind}: counter is {counter} after {expected} writes");
    }
    if !lock.raw().is_idle() {
        bail!("{kind}: lock is not idle after all workers finished");
    }

    let total = (reads.len() + writes.len()) as u64;
    let report = Report {
        kind,
        reads: reads.len() as u64,
        writes: expected,
        elapsed,
        ops_per_sec: stats::ops_per_sec(total, elapsed.as_nanos() as u64),
        read_latency: BenchStats::compute(&mut reads),
        write_latency: BenchStats::compute(&mut writes),
    };
    log::debug!("{kind}: {total} ops in {elapsed:?}");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mix_bounds() {
        assert!(!is_write(0, 0));
        assert!(!is_write(99, 0));
        assert!(is_write(99, 100));
        assert!(is_write(9, 10));
        assert!(!is_write(10, 10));
    }

    #[test]
    fn every_lock_survives_a_small_run() {
        let params = Params {
            threads: 3,
            ops: 200,
            write_percent: 30,
            hold: Duration::ZERO,
            seed: 42,
        };
        for kind in LockKind::ALL {
            let report = run(kind, params).unwrap();
            assert_eq!(report.reads + report.writes, 600);
            assert_eq!(report.kind, kind);
        }
    }

    #[test]
    fn all_writes() {
        let params = Params {
            threads: 2,
            ops: 50,
            write_percent: 100,
            hold: Duration::ZERO,
            seed: 1,
        };
        let report = run(LockKind::FastAtomic, params).unwrap();
        assert_eq!(report.writes, 100);
        assert!(report.read_latency.is_none());
        assert_eq!(report.write_latency.unwrap().count, 100);
    }

    #[test]
    fn zero_threads_is_an_error() {
        let params = Params {
            threads: 0,
            ops: 1,
            write_percent: 0,
            hold: Duration::ZERO,
            seed: 1,
        };
        assert!(run(LockKind::SpinCounter, params).is_err());
    }
}
