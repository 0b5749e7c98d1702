//! The consuming task: takes values until it reads the sentinel.

use crate::buffer::BoundedBuffer;
use crate::delay::{self, DelaySource};
use crate::error::{Error, Result};
use crate::sink::{self, LineSink};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Where the consumer is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
  Running,
  /// The sentinel was read. Reached exactly once.
  Done,
}

/// Outcome of a finished consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
  /// Real values in the order they were taken. The sentinel is not included.
  pub values: Vec<i64>,
}

impl ConsumerReport {
  pub fn consumed(&self) -> usize {
    self.values.len()
  }
}

pub struct Consumer {
  buffer: Arc<BoundedBuffer<i64>>,
  sentinel: i64,
  sink: Arc<dyn LineSink>,
  delay: Box<dyn DelaySource>,
  stall_timeout: Option<Duration>,
}

impl Consumer {
  pub fn new(
    buffer: Arc<BoundedBuffer<i64>>,
    sentinel: i64,
    sink: Arc<dyn LineSink>,
    delay: Box<dyn DelaySource>,
  ) -> Self {
    Consumer {
      buffer,
      sentinel,
      sink,
      delay,
      stall_timeout: None,
    }
  }

  /// Bounds every `take`. Without it an empty buffer with no producer blocks forever.
  pub fn with_stall_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.stall_timeout = timeout;
    self
  }

  /// Takes and emits values until the sentinel arrives.
  ///
  /// # Errors
  ///
  /// `Error::Stalled` if a stall timeout is set and a `take` could not complete in time.
  pub fn run(mut self) -> Result<ConsumerReport> {
    let mut values = Vec::new();
    let mut state = ConsumerState::Running;
    while state == ConsumerState::Running {
      let value = self.fetch()?;
      if value == self.sentinel {
        debug!(consumed = values.len(), "consumer read sentinel");
        state = ConsumerState::Done;
      } else {
        self.sink.write_line(&sink::consumed_line(value));
        values.push(value);
        delay::idle(self.delay.next_delay());
      }
    }
    Ok(ConsumerReport { values })
  }

  fn fetch(&self) -> Result<i64> {
    match self.stall_timeout {
      None => Ok(self.buffer.take()),
      Some(timeout) => self.buffer.take_timeout(timeout).map_err(|_| Error::Stalled {
        task: "consumer",
        timeout,
      }),
    }
  }
}

impl fmt::Debug for Consumer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Consumer")
      .field("buffer", &self.buffer)
      .field("sentinel", &self.sentinel)
      .field("stall_timeout", &self.stall_timeout)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::delay::NoDelay;
  use crate::sink::MemorySink;

  #[test]
  fn stops_at_sentinel() {
    let buffer = Arc::new(BoundedBuffer::new(8).unwrap());
    for value in [4, 5, -1, 6] {
      buffer.put(value);
    }
    let sink = Arc::new(MemorySink::new());
    let report = Consumer::new(Arc::clone(&buffer), -1, sink.clone(), Box::new(NoDelay))
      .run()
      .unwrap();

    assert_eq!(report.values, vec![4, 5]);
    assert_eq!(report.consumed(), 2);
    assert_eq!(sink.lines(), vec!["---> 4", "---> 5"]);
    // Anything after the sentinel is left alone.
    assert_eq!(buffer.try_take(), Ok(6));
  }

  #[test]
  fn stalls_without_producer() {
    let buffer = Arc::new(BoundedBuffer::new(2).unwrap());
    let err = Consumer::new(buffer, -1, Arc::new(MemorySink::new()), Box::new(NoDelay))
      .with_stall_timeout(Some(Duration::from_millis(30)))
      .run()
      .unwrap_err();
    assert!(matches!(err, Error::Stalled { task: "consumer", .. }));
  }
}
