//! rwsync benchmark harness.
//!
//! Drives every selected lock variant through the same seeded read/write
//! mix, checks the shared counter afterwards, and prints a throughput and
//! latency table.

mod cli;
mod logger;
mod stats;
mod workload;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use stats::BenchStats;
use workload::{Params, Report};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logger::init(cli.log_level()).context("failed to install logger")?;
    rwsync::stress::init(cli.stress_max_us, cli.seed);

    let params = Params {
        threads: cli.threads,
        ops: cli.ops,
        write_percent: cli.write_percent,
        hold: Duration::from_micros(cli.hold_us),
        seed: cli.seed,
    };

    let mut reports = Vec::new();
    for kind in cli.selected_locks() {
        log::info!("benchmarking {kind}");
        let report =
            workload::run(kind, params).with_context(|| format!("benchmark of {kind} failed"))?;
        log::info!(
            "{kind}: {} ops/sec over {:.3}s",
            report.ops_per_sec,
            report.elapsed.as_secs_f64()
        );
        reports.push(report);
    }

    print_table(&reports);
    Ok(())
}

fn print_table(reports: &[Report]) {
    println!(
        "{:<18} {:>10} {:>10} {:>12}  {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "lock", "reads", "writes", "ops/sec", "op", "min", "median", "mean", "p99", "max",
    );
    for report in reports {
        print_row(report, "read", report.read_latency.as_ref(), true);
        print_row(report, "write", report.write_latency.as_ref(), false);
    }
}

fn print_row(report: &Report, op: &str, stats: Option<&BenchStats>, first: bool) {
    if first {
        print!(
            "{:<18} {:>10} {:>10} {:>12}  ",
            report.kind.name(),
            report.reads,
            report.writes,
            report.ops_per_sec
        );
    } else {
        print!("{:<18} {:>10} {:>10} {:>12}  ", "", "", "", "");
    }
    match stats {
        Some(s) => println!(
            "{op:>8} {:>8} {:>8} {:>8} {:>8} {:>8}  (ns, sd {})",
            s.min, s.median, s.mean, s.p99, s.max, s.stddev
        ),
        None => println!("{op:>8} {:>8}", "-"),
    }
}
