// src/telemetry.rs

//! Installs the global `tracing` subscriber.
//!
//! Log output goes to stderr so the progress lines on stdout stay clean.

use crate::error::{Error, Result};

use std::io;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Builds the filter: an explicit directive wins, then `RUST_LOG`, then `info`.
pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter> {
  match directive {
    Some(directive) => EnvFilter::try_new(directive).map_err(|e| Error::InvalidConfigValue {
      field: "log_filter".to_string(),
      message: e.to_string(),
    }),
    None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
  }
}

/// Installs a `fmt` subscriber for the whole process.
///
/// # Errors
///
/// - `Error::InvalidConfigValue` if `directive` does not parse.
/// - `Error::TelemetryInit` if a global subscriber is already set.
pub fn init(directive: Option<&str>) -> Result<()> {
  let filter = build_filter(directive)?;
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .with_thread_names(true)
    .with_target(false)
    .try_init()
    .map_err(|e| Error::TelemetryInit(e.to_string()))
}
