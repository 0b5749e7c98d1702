use super::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn rejects_capacity_below_two() {
  assert!(matches!(BoundedBuffer::<i64>::new(0), Err(Error::InvalidCapacity(0))));
  assert!(matches!(BoundedBuffer::<i64>::new(1), Err(Error::InvalidCapacity(1))));
  assert!(BoundedBuffer::<i64>::new(2).is_ok());
}

#[test]
fn oversized_capacity_is_setup_error() {
  match BoundedBuffer::<i64>::new(usize::MAX / 2) {
    Err(Error::Allocation { capacity, .. }) => assert_eq!(capacity, usize::MAX / 2),
    other => panic!("expected Allocation error, got {:?}", other.map(|_| ())),
  }
}

#[test]
fn put_take_fifo() {
  let buffer = BoundedBuffer::new(4).unwrap();
  buffer.put(7);
  buffer.put(-3);
  buffer.put(12);
  assert_eq!(buffer.len(), 3);
  assert_eq!(buffer.take(), 7);
  assert_eq!(buffer.take(), -3);
  assert_eq!(buffer.take(), 12);
  assert!(buffer.is_empty());
}

#[test]
fn usable_capacity_is_one_less() {
  let buffer = BoundedBuffer::new(4).unwrap();
  assert_eq!(buffer.capacity(), 4);
  assert_eq!(buffer.usable_capacity(), 3);
  for i in 0..3 {
    buffer.try_put(i).unwrap();
  }
  assert!(buffer.is_full());
  assert_eq!(buffer.try_put(99), Err(TryPutError::Full(99)));
  // The rejected item must not have overwritten anything.
  assert_eq!(buffer.take(), 0);
  assert_eq!(buffer.take(), 1);
  assert_eq!(buffer.take(), 2);
}

#[test]
fn try_take_empty() {
  let buffer = BoundedBuffer::<i64>::new(2).unwrap();
  assert_eq!(buffer.try_take(), Err(TryTakeError::Empty));
  buffer.try_put(5).unwrap();
  assert_eq!(buffer.try_take(), Ok(5));
  assert_eq!(buffer.try_take(), Err(TryTakeError::Empty));
}

#[test]
fn put_blocks_when_full() {
  let buffer = Arc::new(BoundedBuffer::new(2).unwrap());
  buffer.put(1);

  let producer = {
    let buffer = Arc::clone(&buffer);
    thread::spawn(move || {
      buffer.put(2); // This should block
    })
  };

  thread::sleep(Duration::from_millis(100));
  assert!(!producer.is_finished(), "Put should have blocked");
  assert_eq!(buffer.len(), 1);

  assert_eq!(buffer.take(), 1);
  producer.join().expect("Producer thread panicked");
  assert_eq!(buffer.take(), 2);
}

#[test]
fn take_blocks_when_empty() {
  let buffer = Arc::new(BoundedBuffer::<i64>::new(3).unwrap());

  let consumer = {
    let buffer = Arc::clone(&buffer);
    thread::spawn(move || buffer.take())
  };

  thread::sleep(Duration::from_millis(100));
  assert!(!consumer.is_finished(), "Take should have blocked");

  buffer.put(42);
  assert_eq!(consumer.join().expect("Consumer thread panicked"), 42);
  assert!(buffer.is_empty());
}

#[test]
fn put_timeout_returns_item() {
  let buffer = BoundedBuffer::new(2).unwrap();
  buffer.put("first");
  let err = buffer
    .put_timeout("second", Duration::from_millis(20))
    .unwrap_err();
  assert_eq!(err, PutTimeoutError::Timeout("second"));
  assert_eq!(err.into_inner(), "second");
  assert_eq!(buffer.len(), 1);
}

#[test]
fn take_timeout_on_empty() {
  let buffer = BoundedBuffer::<i64>::new(2).unwrap();
  let start = Instant::now();
  assert_eq!(
    buffer.take_timeout(Duration::from_millis(50)),
    Err(TakeTimeoutError::Timeout)
  );
  assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn take_timeout_woken_by_put() {
  let buffer = Arc::new(BoundedBuffer::new(2).unwrap());
  let producer = {
    let buffer = Arc::clone(&buffer);
    thread::spawn(move || {
      thread::sleep(Duration::from_millis(30));
      buffer.put(9);
    })
  };
  assert_eq!(buffer.take_timeout(Duration::from_secs(3)), Ok(9));
  producer.join().unwrap();
}

#[test]
fn put_timeout_woken_by_take() {
  let buffer = Arc::new(BoundedBuffer::new(2).unwrap());
  buffer.put(1);
  let consumer = {
    let buffer = Arc::clone(&buffer);
    thread::spawn(move || {
      thread::sleep(Duration::from_millis(30));
      buffer.take()
    })
  };
  assert!(buffer.put_timeout(2, Duration::from_secs(3)).is_ok());
  assert_eq!(consumer.join().unwrap(), 1);
  assert_eq!(buffer.take(), 2);
}

#[test]
fn huge_timeout_falls_back_to_blocking() {
  let buffer = BoundedBuffer::new(2).unwrap();
  buffer.put_timeout(3, Duration::MAX).unwrap();
  assert_eq!(buffer.take_timeout(Duration::MAX), Ok(3));
}

#[test]
fn high_water_mark_tracks_peak() {
  let buffer = BoundedBuffer::new(5).unwrap();
  assert_eq!(buffer.high_water_mark(), 0);
  buffer.put(1);
  buffer.put(2);
  buffer.take();
  buffer.put(3);
  buffer.put(4);
  assert_eq!(buffer.high_water_mark(), 3);
  while buffer.try_take().is_ok() {}
  assert_eq!(buffer.high_water_mark(), 3);
}

#[test]
fn never_exceeds_usable_capacity() {
  let buffer = Arc::new(BoundedBuffer::new(4).unwrap());
  let producer = {
    let buffer = Arc::clone(&buffer);
    thread::spawn(move || {
      for i in 0..500 {
        buffer.put(i);
      }
    })
  };
  for expected in 0..500 {
    assert_eq!(buffer.take(), expected);
    if expected % 50 == 0 {
      thread::sleep(Duration::from_millis(1));
    }
  }
  producer.join().unwrap();
  assert!(buffer.high_water_mark() <= 3);
}

#[test]
fn many_waiters_no_loss_no_duplication() {
  // The protocol holds with several waiters per condition.
  let buffer = Arc::new(BoundedBuffer::new(3).unwrap());
  let num_producers = 4;
  let items_per_producer = 250;
  let taken = Arc::new(AtomicUsize::new(0));

  let mut producers = Vec::new();
  for p in 0..num_producers {
    let buffer = Arc::clone(&buffer);
    producers.push(thread::spawn(move || {
      for i in 0..items_per_producer {
        buffer.put(p * items_per_producer + i);
      }
    }));
  }

  let mut consumers = Vec::new();
  for _ in 0..3 {
    let buffer = Arc::clone(&buffer);
    let taken = Arc::clone(&taken);
    consumers.push(thread::spawn(move || {
      let mut seen = Vec::new();
      while taken.fetch_add(1, Ordering::SeqCst) < num_producers * items_per_producer {
        seen.push(buffer.take());
      }
      seen
    }));
  }

  for handle in producers {
    handle.join().unwrap();
  }
  let mut all = HashSet::new();
  for handle in consumers {
    for value in handle.join().unwrap() {
      assert!(all.insert(value), "value {} taken twice", value);
    }
  }
  assert_eq!(all.len(), num_producers * items_per_producer);
  assert!(buffer.is_empty());
}

#[test]
fn debug_shows_state() {
  let buffer = BoundedBuffer::new(3).unwrap();
  buffer.put(1u8);
  let rendered = format!("{:?}", buffer);
  assert!(rendered.contains("capacity: 3"));
  assert!(rendered.contains("len: 1"));
}
