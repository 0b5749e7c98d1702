// src/runner.rs

//! Boss side of the boss-worker model: builds the buffer, starts the producer and
//! consumer threads, waits for both and tears the buffer down.
//!
//! The runner never touches values itself. It is the only place that knows the
//! tasks run on OS threads.

use crate::buffer::BoundedBuffer;
use crate::config::RunConfig;
use crate::consumer::{Consumer, ConsumerReport};
use crate::delay::{self, DelaySource, NoDelay, RandomDelay};
use crate::error::{Error, Result};
use crate::producer::{Producer, ProducerReport};
use crate::sink::{LineSink, StdoutSink};

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const WEYL_CONSTANT: u64 = 0x9E3779B97F4A7C15;

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
  /// Real values the producer stored.
  pub produced: usize,
  /// Real values the consumer took, in order.
  pub consumed: Vec<i64>,
  /// Peak number of items resident in the buffer.
  pub high_water_mark: usize,
  /// Items still in the buffer at teardown. Zero for a clean run.
  pub residual: usize,
}

pub struct Runner {
  config: RunConfig,
  sink: Arc<dyn LineSink>,
  delays: Option<(Box<dyn DelaySource>, Box<dyn DelaySource>)>,
}

impl Runner {
  /// Validates `config` and prepares a run that prints to stdout and idles for
  /// the configured random delays.
  pub fn new(config: RunConfig) -> Result<Self> {
    config.validate()?;
    Ok(Runner {
      config,
      sink: Arc::new(StdoutSink),
      delays: None,
    })
  }

  /// Sends progress lines to `sink` instead of stdout.
  pub fn with_sink(mut self, sink: Arc<dyn LineSink>) -> Self {
    self.sink = sink;
    self
  }

  /// Replaces the configured delays for the producer and the consumer.
  pub fn with_delays(mut self, producer: Box<dyn DelaySource>, consumer: Box<dyn DelaySource>) -> Self {
    self.delays = Some((producer, consumer));
    self
  }

  pub fn config(&self) -> &RunConfig {
    &self.config
  }

  /// Runs both tasks to completion.
  ///
  /// # Errors
  ///
  /// - Setup failures (`InvalidCapacity`, `Spawn`) before any value moves.
  /// - `TaskPanicked` if either thread panicked.
  /// - `Stalled` if a stall timeout is configured and a task stopped making progress.
  pub fn run(self) -> Result<RunReport> {
    let Runner { config, sink, delays } = self;
    let buffer = Arc::new(BoundedBuffer::new(config.capacity)?);
    let (producer_delay, consumer_delay) = match delays {
      Some(delays) => delays,
      None => default_delays(&config),
    };
    let stall_timeout = config.stall_timeout();

    let consumer = Consumer::new(
      Arc::clone(&buffer),
      config.sentinel,
      Arc::clone(&sink),
      consumer_delay,
    )
    .with_stall_timeout(stall_timeout);
    let producer = Producer::new(
      Arc::clone(&buffer),
      config.item_count,
      config.sentinel,
      sink,
      producer_delay,
    )
    .with_stall_timeout(stall_timeout);

    info!(
      capacity = config.capacity,
      item_count = config.item_count,
      sentinel = config.sentinel,
      "starting consumer and producer"
    );

    let consumer_handle = spawn("consumer", move || consumer.run())?;
    let producer_result = spawn("producer", move || producer.run()).and_then(|h| join("producer", h));
    if producer_result.is_err() {
      // The consumer only stops at the sentinel; hand it one so it can be joined.
      release_consumer(&buffer, config.sentinel, stall_timeout);
    }
    let consumer_result = join("consumer", consumer_handle);

    let ProducerReport { produced } = producer_result?;
    let ConsumerReport { values } = consumer_result?;

    let (high_water_mark, residual) = teardown(buffer);
    info!(produced, consumed = values.len(), high_water_mark, "run complete");

    Ok(RunReport {
      produced,
      consumed: values,
      high_water_mark,
      residual,
    })
  }
}

impl fmt::Debug for Runner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Runner")
      .field("config", &self.config)
      .field("custom_delays", &self.delays.is_some())
      .finish_non_exhaustive()
  }
}

fn default_delays(config: &RunConfig) -> (Box<dyn DelaySource>, Box<dyn DelaySource>) {
  if !config.delay.enabled {
    return (Box::new(NoDelay), Box::new(NoDelay));
  }
  let unit = Duration::from_millis(config.delay.unit_ms);
  let max_units = u32::try_from(config.capacity).unwrap_or(u32::MAX);
  let seed = delay::clock_seed();
  (
    Box::new(RandomDelay::new(seed, unit, max_units)),
    Box::new(RandomDelay::new(seed.wrapping_add(WEYL_CONSTANT), unit, max_units)),
  )
}

fn spawn<F, R>(task: &'static str, body: F) -> Result<JoinHandle<Result<R>>>
where
  F: FnOnce() -> Result<R> + Send + 'static,
  R: Send + 'static,
{
  thread::Builder::new()
    .name(task.to_string())
    .spawn(body)
    .map_err(|source| Error::Spawn { task, source })
}

fn join<R>(task: &'static str, handle: JoinHandle<Result<R>>) -> Result<R> {
  let result = handle.join().map_err(|_| Error::TaskPanicked { task })?;
  debug!(task, ok = result.is_ok(), "task joined");
  result
}

fn release_consumer(buffer: &BoundedBuffer<i64>, sentinel: i64, stall_timeout: Option<Duration>) {
  warn!("producer did not finish; storing sentinel on its behalf");
  match stall_timeout {
    None => buffer.put(sentinel),
    Some(timeout) => {
      if buffer.put_timeout(sentinel, timeout).is_err() {
        warn!("could not store sentinel, consumer is not draining");
      }
    }
  }
}

/// Drops the last handle to the buffer. Returns the high-water mark and the
/// number of unread items.
fn teardown(buffer: Arc<BoundedBuffer<i64>>) -> (usize, usize) {
  debug_assert_eq!(Arc::strong_count(&buffer), 1, "buffer still shared at teardown");
  let high_water_mark = buffer.high_water_mark();
  let residual = buffer.len();
  if residual > 0 {
    warn!(residual, "buffer torn down with unread items");
  }
  drop(buffer);
  (high_water_mark, residual)
}
