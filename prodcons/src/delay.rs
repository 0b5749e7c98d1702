//! Idle-time sources for the producer and consumer.
//!
//! Delays only vary the timing of a run, never its values. The binary uses a
//! clock-seeded [`RandomDelay`]; tests swap in [`NoDelay`] or [`ScriptedDelay`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Produces the idle time a task waits between two buffer operations.
pub trait DelaySource: Send {
  fn next_delay(&mut self) -> Duration;
}

/// Never idles.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl DelaySource for NoDelay {
  fn next_delay(&mut self) -> Duration {
    Duration::ZERO
  }
}

/// Always idles for the same duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl DelaySource for FixedDelay {
  fn next_delay(&mut self) -> Duration {
    self.0
  }
}

/// Replays a fixed list of delays, then stops idling.
#[derive(Debug, Default, Clone)]
pub struct ScriptedDelay {
  remaining: VecDeque<Duration>,
}

impl ScriptedDelay {
  pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
    ScriptedDelay {
      remaining: delays.into_iter().collect(),
    }
  }
}

impl DelaySource for ScriptedDelay {
  fn next_delay(&mut self) -> Duration {
    self.remaining.pop_front().unwrap_or(Duration::ZERO)
  }
}

/// Idles for a random whole number of `unit`s in `[0, max_units)`.
#[derive(Debug)]
pub struct RandomDelay {
  rng: StdRng,
  unit: Duration,
  max_units: u32,
}

impl RandomDelay {
  pub fn new(seed: u64, unit: Duration, max_units: u32) -> Self {
    RandomDelay {
      rng: StdRng::seed_from_u64(seed),
      unit,
      max_units,
    }
  }

  /// Seeds the generator from the wall clock.
  pub fn from_clock(unit: Duration, max_units: u32) -> Self {
    Self::new(clock_seed(), unit, max_units)
  }
}

impl DelaySource for RandomDelay {
  fn next_delay(&mut self) -> Duration {
    if self.max_units == 0 {
      return Duration::ZERO;
    }
    self.unit * self.rng.random_range(0..self.max_units)
  }
}

/// Sleeps for `delay` unless it is zero.
#[inline]
pub(crate) fn idle(delay: Duration) {
  if !delay.is_zero() {
    thread::sleep(delay);
  }
}

/// Nanoseconds since the epoch, folded into 64 bits.
pub fn clock_seed() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_nanos() as u64)
    .unwrap_or(0)
}
