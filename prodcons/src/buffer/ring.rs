use std::collections::TryReserveError;
use std::fmt;

/// The cursor state behind a [`BoundedBuffer`](super::BoundedBuffer).
///
/// Not synchronized on its own; every access happens under the buffer's mutex.
/// One slot is always left unoccupied so that `read == write` means empty and
/// `(write + 1) % capacity == read` means full.
pub(crate) struct Ring<T> {
  slots: Box<[Option<T>]>,
  read: usize,
  write: usize,
  high_water: usize,
}

impl<T> Ring<T> {
  /// Allocates `capacity` empty slots, reporting allocation failure instead of
  /// aborting.
  pub(crate) fn try_new(capacity: usize) -> Result<Self, TryReserveError> {
    debug_assert!(capacity >= 2);
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity)?;
    slots.resize_with(capacity, || None);
    Ok(Ring {
      slots: slots.into_boxed_slice(),
      read: 0,
      write: 0,
      high_water: 0,
    })
  }

  #[inline]
  pub(crate) fn capacity(&self) -> usize {
    self.slots.len()
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.read == self.write
  }

  #[inline]
  pub(crate) fn is_full(&self) -> bool {
    (self.write + 1) % self.capacity() == self.read
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    (self.write + self.capacity() - self.read) % self.capacity()
  }

  /// Largest number of items that were resident at the same time.
  #[inline]
  pub(crate) fn high_water(&self) -> usize {
    self.high_water
  }

  /// Stores `value` at the write cursor and advances it.
  ///
  /// # Panics
  ///
  /// If the ring is full or the slot under the write cursor still holds an
  /// unread item. Either means the caller skipped the full check.
  pub(crate) fn push(&mut self, value: T) {
    assert!(
      !self.is_full(),
      "bounded buffer: push on a full ring (read={}, write={})",
      self.read,
      self.write
    );
    let slot = &mut self.slots[self.write];
    assert!(
      slot.is_none(),
      "bounded buffer: write cursor {} ran into an unread slot",
      self.write
    );
    *slot = Some(value);
    self.write = (self.write + 1) % self.capacity();
    self.high_water = self.high_water.max(self.len());
  }

  /// Removes the item at the read cursor and advances it.
  ///
  /// # Panics
  ///
  /// If the ring is empty or the slot under the read cursor was never written.
  pub(crate) fn pop(&mut self) -> T {
    assert!(
      !self.is_empty(),
      "bounded buffer: pop on an empty ring (read={}, write={})",
      self.read,
      self.write
    );
    match self.slots[self.read].take() {
      Some(value) => {
        self.read = (self.read + 1) % self.capacity();
        value
      }
      None => unreachable!("bounded buffer: read cursor {} points at an empty slot", self.read),
    }
  }
}

impl<T> fmt::Debug for Ring<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Ring")
      .field("capacity", &self.capacity())
      .field("read", &self.read)
      .field("write", &self.write)
      .field("len", &self.len())
      .field("high_water", &self.high_water)
      .finish_non_exhaustive()
  }
}
