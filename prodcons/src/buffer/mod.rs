// src/buffer/mod.rs

//! A blocking, fixed-capacity circular buffer for handing items between threads.
//!
//! ### Design Principles:
//!
//! 1.  **Central Mutex**: A single `parking_lot::Mutex` guards the slots and both
//!     cursors. Nothing about the buffer is read or written outside of it.
//! 2.  **Two Conditions**: Producers blocked on a full buffer wait on `not_full`;
//!     consumers blocked on an empty buffer wait on `not_empty`. Each successful
//!     `put` signals one `not_empty` waiter and each successful `take` signals one
//!     `not_full` waiter.
//! 3.  **Wait, Re-check, Loop**: A woken thread always re-evaluates its predicate
//!     under the lock before touching the ring. This keeps the protocol correct
//!     under spurious wakeups and with more than one waiter per condition.
//!
//! The buffer leaves one slot unused, so a buffer built with capacity `C` holds at
//! most `C - 1` items.
//!
//! `put` and `take` have no cancellation path and may block forever. The
//! `*_timeout` variants are an extension on top of the same protocol for callers
//! that need a bound.

mod ring;

#[cfg(test)]
mod tests;

use crate::error::{Error, PutTimeoutError, Result, TakeTimeoutError, TryPutError, TryTakeError};
use self::ring::Ring;

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::trace;

/// Smallest capacity that leaves at least one usable slot.
pub const MIN_CAPACITY: usize = 2;

/// A bounded FIFO buffer with blocking `put` and `take`.
///
/// Share it between threads with an `Arc`. It is `Sync` whenever `T: Send`.
pub struct BoundedBuffer<T> {
  state: Mutex<Ring<T>>,
  not_full: Condvar,
  not_empty: Condvar,
  capacity: usize,
}

impl<T> BoundedBuffer<T> {
  /// Creates an empty buffer with `capacity` slots (`capacity - 1` usable).
  ///
  /// # Errors
  ///
  /// - `Error::InvalidCapacity` if `capacity` is below [`MIN_CAPACITY`].
  /// - `Error::Allocation` if the slots cannot be allocated.
  pub fn new(capacity: usize) -> Result<Self> {
    if capacity < MIN_CAPACITY {
      return Err(Error::InvalidCapacity(capacity));
    }
    let ring = Ring::try_new(capacity).map_err(|source| Error::Allocation { capacity, source })?;
    Ok(BoundedBuffer {
      state: Mutex::new(ring),
      not_full: Condvar::new(),
      not_empty: Condvar::new(),
      capacity,
    })
  }

  /// Stores `value`, blocking the current thread while the buffer is full.
  pub fn put(&self, value: T) {
    let mut ring = self.state.lock();
    while ring.is_full() {
      trace!(len = ring.len(), "buffer full, waiting on not_full");
      self.not_full.wait(&mut ring);
    }
    ring.push(value);
    self.not_empty.notify_one();
  }

  /// Removes and returns the oldest item, blocking the current thread while the
  /// buffer is empty.
  pub fn take(&self) -> T {
    let mut ring = self.state.lock();
    while ring.is_empty() {
      trace!("buffer empty, waiting on not_empty");
      self.not_empty.wait(&mut ring);
    }
    let value = ring.pop();
    self.not_full.notify_one();
    value
  }

  /// Attempts to store `value` without blocking.
  ///
  /// # Errors
  ///
  /// - `Err(TryPutError::Full(value))` if every usable slot is occupied.
  pub fn try_put(&self, value: T) -> Result<(), TryPutError<T>> {
    let mut ring = self.state.lock();
    if ring.is_full() {
      return Err(TryPutError::Full(value));
    }
    ring.push(value);
    self.not_empty.notify_one();
    Ok(())
  }

  /// Attempts to remove the oldest item without blocking.
  ///
  /// # Errors
  ///
  /// - `Err(TryTakeError::Empty)` if the buffer holds no items.
  pub fn try_take(&self) -> Result<T, TryTakeError> {
    let mut ring = self.state.lock();
    if ring.is_empty() {
      return Err(TryTakeError::Empty);
    }
    let value = ring.pop();
    self.not_full.notify_one();
    Ok(value)
  }

  /// Stores `value`, blocking for at most `timeout` while the buffer is full.
  ///
  /// # Errors
  ///
  /// - `Err(PutTimeoutError::Timeout(value))` if no slot freed up in time.
  pub fn put_timeout(&self, value: T, timeout: Duration) -> Result<(), PutTimeoutError<T>> {
    let Some(deadline) = Instant::now().checked_add(timeout) else {
      self.put(value);
      return Ok(());
    };
    let mut ring = self.state.lock();
    while ring.is_full() {
      trace!(len = ring.len(), "buffer full, waiting on not_full with deadline");
      if self.not_full.wait_until(&mut ring, deadline).timed_out() && ring.is_full() {
        return Err(PutTimeoutError::Timeout(value));
      }
    }
    ring.push(value);
    self.not_empty.notify_one();
    Ok(())
  }

  /// Removes the oldest item, blocking for at most `timeout` while the buffer is
  /// empty.
  ///
  /// # Errors
  ///
  /// - `Err(TakeTimeoutError::Timeout)` if nothing arrived in time.
  pub fn take_timeout(&self, timeout: Duration) -> Result<T, TakeTimeoutError> {
    let Some(deadline) = Instant::now().checked_add(timeout) else {
      return Ok(self.take());
    };
    let mut ring = self.state.lock();
    while ring.is_empty() {
      trace!("buffer empty, waiting on not_empty with deadline");
      if self.not_empty.wait_until(&mut ring, deadline).timed_out() && ring.is_empty() {
        return Err(TakeTimeoutError::Timeout);
      }
    }
    let value = ring.pop();
    self.not_full.notify_one();
    Ok(value)
  }

  /// Returns the number of slots, including the one that is always left empty.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns the maximum number of items the buffer can hold at once.
  #[inline]
  pub fn usable_capacity(&self) -> usize {
    self.capacity - 1
  }

  /// Returns the number of items currently in the buffer.
  pub fn len(&self) -> usize {
    self.state.lock().len()
  }

  /// Returns `true` if the buffer is currently empty.
  pub fn is_empty(&self) -> bool {
    self.state.lock().is_empty()
  }

  /// Returns `true` if the buffer is currently full.
  pub fn is_full(&self) -> bool {
    self.state.lock().is_full()
  }

  /// Returns the largest number of items that have been resident at once since
  /// the buffer was created.
  pub fn high_water_mark(&self) -> usize {
    self.state.lock().high_water()
  }
}

impl<T> fmt::Debug for BoundedBuffer<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut dbg = f.debug_struct("BoundedBuffer");
    dbg.field("capacity", &self.capacity);
    match self.state.try_lock() {
      Some(ring) => dbg.field("state", &*ring),
      None => dbg.field("state", &"<locked>"),
    };
    dbg.finish_non_exhaustive()
  }
}
