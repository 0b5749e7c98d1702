// src/error.rs

use core::fmt;
use std::collections::TryReserveError;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// The main error type for the `prodcons` crate.
///
/// Setup failures (`InvalidCapacity` through `TelemetryInit`) are fatal and are
/// returned before either task starts. `TaskPanicked` and `Stalled` can only
/// surface once the run is underway.
#[derive(Debug, Error)]
pub enum Error {
  #[error("buffer capacity must be at least 2 slots, got {0}")]
  InvalidCapacity(usize),

  #[error("Failed to allocate {capacity} buffer slots: {source}")]
  Allocation {
    capacity: usize,
    #[source]
    source: TryReserveError,
  },

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidConfigValue { field: String, message: String },

  #[error("Configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("Failed to spawn {task} thread: {source}")]
  Spawn {
    task: &'static str,
    #[source]
    source: io::Error,
  },

  #[error("Failed to set global tracing subscriber: {0}")]
  TelemetryInit(String),

  #[error("{task} thread panicked")]
  TaskPanicked { task: &'static str },

  #[error("{task} made no progress within {timeout:?}")]
  Stalled { task: &'static str, timeout: Duration },
}

/// A specialized `Result` type for `prodcons` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// Buffer-level error kinds. The ones carrying a `T` hand the unsent item back.
macro_rules! impl_error_for_enum_with_inner {
    (
        $enum_name:ident < $generic_param:ident >,
        $($variant:ident ( $message:expr ) ),+
        $(,)?
    ) => {
        impl<$generic_param> $enum_name<$generic_param> {
            /// Consumes the error, returning the item that was not stored.
            #[inline]
            pub fn into_inner(self) -> $generic_param {
                match self {
                    $( $enum_name::$variant(v) => v, )+
                }
            }
        }

        impl<$generic_param> fmt::Display for $enum_name<$generic_param> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( $enum_name::$variant(_) => f.write_str($message), )+
                }
            }
        }

        impl<$generic_param: fmt::Debug> std::error::Error for $enum_name<$generic_param> {}
    };
}

/// Error returned by `try_put` when the item could not be stored immediately.
#[derive(PartialEq, Eq, Clone)]
pub enum TryPutError<T> {
  /// Every usable slot is occupied. The item is returned.
  Full(T),
}

impl<T> fmt::Debug for TryPutError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryPutError::Full(_) => write!(f, "TryPutError::Full(..)"),
    }
  }
}

impl_error_for_enum_with_inner!(TryPutError<T>, Full("buffer full"));

/// Error returned by `put_timeout`.
#[derive(PartialEq, Eq, Clone)]
pub enum PutTimeoutError<T> {
  /// The deadline passed while the buffer stayed full. The item is returned.
  Timeout(T),
}

impl<T> fmt::Debug for PutTimeoutError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PutTimeoutError::Timeout(_) => write!(f, "PutTimeoutError::Timeout(..)"),
    }
  }
}

impl_error_for_enum_with_inner!(PutTimeoutError<T>, Timeout("put operation timed out"));

/// Error returned by `try_take` when no item is available.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryTakeError {
  Empty,
}
impl std::error::Error for TryTakeError {}
impl fmt::Display for TryTakeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryTakeError::Empty => write!(f, "buffer empty"),
    }
  }
}

/// Error returned by `take_timeout`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TakeTimeoutError {
  /// The deadline passed while the buffer stayed empty.
  Timeout,
}
impl std::error::Error for TakeTimeoutError {}
impl fmt::Display for TakeTimeoutError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TakeTimeoutError::Timeout => write!(f, "take operation timed out"),
    }
  }
}
