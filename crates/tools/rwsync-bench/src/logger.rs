//! Stderr backend for the `log` facade.

use std::io::Write as _;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes `[  elapsed LEVEL target] message` lines to stderr.
struct StderrLogger {
    start: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.start.elapsed();
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        // Lock once so lines from concurrent workers do not interleave.
        let mut err = std::io::stderr().lock();
        let _ = writeln!(
            err,
            "[{:>5}.{:03} {level} {}] {}",
            elapsed.as_secs(),
            elapsed.subsec_millis(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs the stderr logger with the given maximum level.
///
/// Returns an error if a logger was already installed.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(StderrLogger {
        start: Instant::now(),
    }))?;
    log::set_max_level(level);
    Ok(())
}
