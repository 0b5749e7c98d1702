// src/config.rs

//! Run configuration: buffer capacity, item count, sentinel and the timing knobs
//! of the two tasks.
//!
//! Every field has a default, so an empty YAML document (or no file at all) yields
//! the reference setup of a 4-slot buffer, 11 items and a sentinel of `-1`.

use crate::error::{Error, Result};

use serde::Deserialize;
use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const DEFAULT_CONFIG_BASE_NAME: &str = "prodcons";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

pub const DEFAULT_CAPACITY: usize = 4;
pub const DEFAULT_ITEM_COUNT: usize = 11;
pub const DEFAULT_SENTINEL: i64 = -1;
pub const DEFAULT_DELAY_UNIT_MS: u64 = 1000;

/// Settings for one producer/consumer run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
  /// Number of buffer slots. One is always left empty.
  pub capacity: usize,
  /// Number of real values the producer generates before the sentinel.
  pub item_count: usize,
  /// End-of-stream marker. Must lie outside `0..item_count`.
  pub sentinel: i64,
  pub delay: DelayConfig,
  /// When set, a task that cannot `put`/`take` within this many milliseconds
  /// gives up with `Error::Stalled` instead of blocking forever.
  ///
  /// A task waits on its peer, and the peer may idle for up to
  /// `delay.unit_ms * (capacity - 1)` between operations. A timeout shorter than
  /// that can stall a healthy run; `validate` logs a warning for it.
  pub stall_timeout_ms: Option<u64>,
  /// A `tracing_subscriber::EnvFilter` directive. Falls back to `RUST_LOG`.
  pub log_filter: Option<String>,
}

/// Random idle time inserted after every `put` and every processed `take`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DelayConfig {
  pub enabled: bool,
  /// Each delay is a random whole number of these units in `[0, capacity)`.
  pub unit_ms: u64,
}

impl Default for RunConfig {
  fn default() -> Self {
    RunConfig {
      capacity: DEFAULT_CAPACITY,
      item_count: DEFAULT_ITEM_COUNT,
      sentinel: DEFAULT_SENTINEL,
      delay: DelayConfig::default(),
      stall_timeout_ms: None,
      log_filter: None,
    }
  }
}

impl Default for DelayConfig {
  fn default() -> Self {
    DelayConfig {
      enabled: true,
      unit_ms: DEFAULT_DELAY_UNIT_MS,
    }
  }
}

impl RunConfig {
  /// Parses a YAML document. The result is not validated yet.
  pub fn from_yaml_str(source: &str) -> Result<Self> {
    serde_yaml::from_str(source).map_err(|e| Error::ConfigParse(e.to_string()))
  }

  /// Reads and parses a YAML file. The result is not validated yet.
  pub fn from_file(path: &Path) -> Result<Self> {
    let file = File::open(path)?;
    let reader = io::BufReader::new(file);
    serde_yaml::from_reader(reader).map_err(|e| Error::ConfigParse(e.to_string()))
  }

  /// Checks the constraints the run relies on.
  ///
  /// The sentinel travels through the buffer as ordinary data, so it is only
  /// recognizable if no produced value can equal it.
  pub fn validate(&self) -> Result<()> {
    if self.capacity < crate::buffer::MIN_CAPACITY {
      return Err(Error::InvalidCapacity(self.capacity));
    }
    let item_count = i64::try_from(self.item_count).map_err(|_| Error::InvalidConfigValue {
      field: "item_count".to_string(),
      message: format!("{} does not fit the produced value range", self.item_count),
    })?;
    if (0..item_count).contains(&self.sentinel) {
      return Err(Error::InvalidConfigValue {
        field: "sentinel".to_string(),
        message: format!(
          "{} collides with produced values 0..{}",
          self.sentinel, self.item_count
        ),
      });
    }
    if self.stall_timeout_ms == Some(0) {
      return Err(Error::InvalidConfigValue {
        field: "stall_timeout_ms".to_string(),
        message: "must be greater than 0 when set".to_string(),
      });
    }
    if self.stall_timeout_below_max_delay() {
      warn!(
        stall_timeout = ?self.stall_timeout(),
        max_delay = ?self.max_delay(),
        "stall_timeout_ms is shorter than the longest task delay; a healthy run may stall"
      );
    }
    Ok(())
  }

  pub fn stall_timeout(&self) -> Option<Duration> {
    self.stall_timeout_ms.map(Duration::from_millis)
  }

  /// Longest idle either task can insert between two buffer operations, or `None`
  /// when delays are disabled.
  pub fn max_delay(&self) -> Option<Duration> {
    if !self.delay.enabled {
      return None;
    }
    let units = self.capacity.saturating_sub(1);
    let units = u32::try_from(units).unwrap_or(u32::MAX);
    Some(Duration::from_millis(self.delay.unit_ms).saturating_mul(units))
  }

  /// `true` when the stall timeout can fire while the peer task is only idling.
  pub fn stall_timeout_below_max_delay(&self) -> bool {
    matches!(
      (self.stall_timeout(), self.max_delay()),
      (Some(stall), Some(max_delay)) if stall < max_delay
    )
  }
}

/// Finds the configuration file based on common patterns and an optional environment suffix.
///
/// Looks for `prodcons.<env>.yaml` then `prodcons.yaml` in `dir`, where `<env>`
/// comes from `environment_suffix`, `PRODCONS_ENV` or `APP_ENV`, in that order.
pub fn find_config_file(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let base_name = DEFAULT_CONFIG_BASE_NAME;
  let extension = DEFAULT_CONFIG_EXTENSION;

  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("PRODCONS_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();

  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!("{}.{}.{}", base_name, env_str, extension));
    }
  }
  files_to_check.push(format!("{}.{}", base_name, extension));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check PRODCONS_ENV/APP_ENV.",
    files_to_check, dir
  )))
}
