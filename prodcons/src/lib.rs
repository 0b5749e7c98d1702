//! A bounded circular buffer that coordinates one producer thread and one
//! consumer thread.
//!
//! The buffer ([`BoundedBuffer`]) is guarded by a single mutex and two condition
//! variables. A producer blocks while it is full, a consumer blocks while it is
//! empty, and an in-band sentinel value marks the end of the stream. The
//! [`Runner`] wires a [`Producer`] and a [`Consumer`] to one buffer, runs them on
//! their own threads and waits for both.

pub mod buffer;
pub mod config;
pub mod consumer;
pub mod delay;
pub mod error;
pub mod producer;
pub mod runner;
pub mod sink;
pub mod telemetry;

pub use buffer::BoundedBuffer;
pub use config::RunConfig;
pub use consumer::{Consumer, ConsumerReport, ConsumerState};
pub use error::{Error, PutTimeoutError, Result, TakeTimeoutError, TryPutError, TryTakeError};
pub use producer::{Producer, ProducerReport, ProducerState};
pub use runner::{RunReport, Runner};
