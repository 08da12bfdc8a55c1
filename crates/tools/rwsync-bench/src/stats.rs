//! Integer-only latency statistics.
//!
//! Samples are per-operation latencies in nanoseconds. Everything is `u64`
//! arithmetic with `u128` intermediates; no floating point.

/// Computed statistics for one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchStats {
    /// Minimum sample value (ns).
    pub min: u64,
    /// Maximum sample value (ns).
    pub max: u64,
    /// Median sample value (ns).
    pub median: u64,
    /// 99th percentile sample value (ns, nearest rank).
    pub p99: u64,
    /// Mean sample value (ns).
    pub mean: u64,
    /// Standard deviation (integer approximation, ns).
    pub stddev: u64,
    /// Number of samples.
    pub count: usize,
}

impl BenchStats {
    /// Compute statistics from a mutable slice of samples.
    ///
    /// The slice is sorted in place. Returns `None` if the slice is empty.
    pub fn compute(samples: &mut [u64]) -> Option<Self> {
        let n = samples.len();
        if n == 0 {
            return None;
        }

        samples.sort_unstable();

        let min = samples[0];
        let max = samples[n - 1];
        let median = if n % 2 == 0 {
            (samples[n / 2 - 1] + samples[n / 2]) / 2
        } else {
            samples[n / 2]
        };
        let p99 = samples[percentile_rank(n, 99)];

        // Mean via u128 to avoid overflow.
        let sum: u128 = samples.iter().map(|&s| u128::from(s)).sum();
        let mean = (sum / n as u128) as u64;

        // Stddev via integer square root of variance.
        let variance = if n > 1 {
            let var_sum: u128 = samples
                .iter()
                .map(|&s| {
                    let diff = s.abs_diff(mean);
                    u128::from(diff) * u128::from(diff)
                })
                .sum();
            (var_sum / (n as u128 - 1)) as u64
        } else {
            0
        };

        Some(Self {
            min,
            max,
            median,
            p99,
            mean,
            stddev: isqrt(variance),
            count: n,
        })
    }
}

/// Zero-based index of the nearest-rank `pct`th percentile in `n` sorted samples.
fn percentile_rank(n: usize, pct: usize) -> usize {
    (n * pct).div_ceil(100).saturating_sub(1).min(n - 1)
}

/// Integer square root via Newton's method.
fn isqrt(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = x.div_ceil(2);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Operations per second for `ops` operations completed in `elapsed_ns`.
pub fn ops_per_sec(ops: u64, elapsed_ns: u64) -> u64 {
    if elapsed_ns == 0 {
        return 0;
    }
    (u128::from(ops) * 1_000_000_000 / u128::from(elapsed_ns)) as u64
}
