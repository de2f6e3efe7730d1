// src/utils/logger.rs

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

static LOGGER: ConsoleLogger = ConsoleLogger;
static MAX_LEVEL: AtomicUsize = AtomicUsize::new(LevelFilter::Info as usize);

struct ConsoleLogger;

/// Installs the stderr logger. Fails if a logger is already set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  MAX_LEVEL.store(level as usize, Ordering::Relaxed);
  log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// Maps `-v` counts onto a level: 0 = warn, 1 = info, 2 = debug, 3+ = trace
pub fn level_for_verbosity(verbose: u8, quiet: bool) -> LevelFilter {
  if quiet {
    return LevelFilter::Error;
  }
  match verbose {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  }
}

fn level_icon(level: Level) -> &'static str {
  match level {
    Level::Error => "🔴",
    Level::Warn => "🟠",
    Level::Info => "🔵",
    Level::Debug => "⚪",
    Level::Trace => "▫️",
  }
}

impl log::Log for ConsoleLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    (metadata.level() as usize) <= MAX_LEVEL.load(Ordering::Relaxed)
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      // Format: "🔴  File not found"
      let stderr = std::io::stderr();
      let mut out = stderr.lock();
      let _ = writeln!(out, "{}  {}", level_icon(record.level()), record.args());
    }
  }

  fn flush(&self) {
    let _ = std::io::stderr().flush();
  }
}
