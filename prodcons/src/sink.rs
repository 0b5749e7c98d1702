//! Line-oriented output for progress messages.

use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::warn;

/// Receives one progress line per produced or consumed value.
///
/// Lines written by the same task must come out in the order they were written.
pub trait LineSink: Send + Sync {
  fn write_line(&self, line: &str);
}

/// Writes lines to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
  fn write_line(&self, line: &str) {
    let mut out = io::stdout().lock();
    if let Err(e) = writeln!(out, "{}", line) {
      warn!(error = %e, "failed to write progress line to stdout");
    }
  }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
  lines: Mutex<Vec<String>>,
}

impl MemorySink {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns a copy of every line written so far.
  pub fn lines(&self) -> Vec<String> {
    self.lines.lock().clone()
  }
}

impl LineSink for MemorySink {
  fn write_line(&self, line: &str) {
    self.lines.lock().push(line.to_string());
  }
}

pub(crate) fn produced_line(value: i64) -> String {
  format!("{} --->", value)
}

pub(crate) fn consumed_line(value: i64) -> String {
  format!("---> {}", value)
}
