//! The producing task: `item_count` values, then the sentinel.

use crate::buffer::BoundedBuffer;
use crate::delay::{self, DelaySource};
use crate::error::{Error, Result};
use crate::sink::{self, LineSink};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Where the producer is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
  /// Still generating real values; `next` is the one about to be stored.
  Running { next: usize },
  /// All real values are stored; the sentinel is next.
  Finalizing,
  Done,
}

/// Outcome of a finished producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerReport {
  /// Real values stored, not counting the sentinel.
  pub produced: usize,
}

pub struct Producer {
  buffer: Arc<BoundedBuffer<i64>>,
  item_count: usize,
  sentinel: i64,
  sink: Arc<dyn LineSink>,
  delay: Box<dyn DelaySource>,
  stall_timeout: Option<Duration>,
}

impl Producer {
  pub fn new(
    buffer: Arc<BoundedBuffer<i64>>,
    item_count: usize,
    sentinel: i64,
    sink: Arc<dyn LineSink>,
    delay: Box<dyn DelaySource>,
  ) -> Self {
    Producer {
      buffer,
      item_count,
      sentinel,
      sink,
      delay,
      stall_timeout: None,
    }
  }

  /// Bounds every `put`. Without it a full buffer with no consumer blocks forever.
  pub fn with_stall_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.stall_timeout = timeout;
    self
  }

  /// Stores `0..item_count` in order, then the sentinel.
  ///
  /// # Errors
  ///
  /// `Error::Stalled` if a stall timeout is set and a `put` could not complete in time.
  pub fn run(mut self) -> Result<ProducerReport> {
    let mut state = ProducerState::Running { next: 0 };
    loop {
      state = match state {
        ProducerState::Running { next } if next < self.item_count => {
          let value = next as i64;
          self.sink.write_line(&sink::produced_line(value));
          self.store(value)?;
          delay::idle(self.delay.next_delay());
          ProducerState::Running { next: next + 1 }
        }
        ProducerState::Running { .. } => {
          debug!(produced = self.item_count, "producer finalizing");
          ProducerState::Finalizing
        }
        ProducerState::Finalizing => {
          self.store(self.sentinel)?;
          debug!(sentinel = self.sentinel, "producer stored sentinel");
          ProducerState::Done
        }
        ProducerState::Done => break,
      };
    }
    Ok(ProducerReport {
      produced: self.item_count,
    })
  }

  fn store(&self, value: i64) -> Result<()> {
    match self.stall_timeout {
      None => {
        self.buffer.put(value);
        Ok(())
      }
      Some(timeout) => self
        .buffer
        .put_timeout(value, timeout)
        .map_err(|_| Error::Stalled {
          task: "producer",
          timeout,
        }),
    }
  }
}

impl fmt::Debug for Producer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Producer")
      .field("buffer", &self.buffer)
      .field("item_count", &self.item_count)
      .field("sentinel", &self.sentinel)
      .field("stall_timeout", &self.stall_timeout)
      .finish_non_exhaustive()
  }
}
