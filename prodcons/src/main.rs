use prodcons::config::{self, RunConfig};
use prodcons::{telemetry, Error, Result, Runner};

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
  match run() {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("prodcons: {}", e);
      ExitCode::FAILURE
    }
  }
}

fn run() -> Result<()> {
  let (config, source) = load_config()?;
  telemetry::init(config.log_filter.as_deref())?;
  match &source {
    Some(path) => info!(config = ?path, "loaded configuration"),
    None => info!("no configuration file, using defaults"),
  }

  let report = Runner::new(config)?.run()?;
  info!(
    produced = report.produced,
    consumed = report.consumed.len(),
    high_water_mark = report.high_water_mark,
    "producer and consumer finished"
  );
  Ok(())
}

/// An explicit path argument must exist. Without one, a missing file means defaults.
fn load_config() -> Result<(RunConfig, Option<PathBuf>)> {
  if let Some(arg) = env::args_os().nth(1) {
    let path = PathBuf::from(arg);
    return Ok((RunConfig::from_file(&path)?, Some(path)));
  }
  match config::find_config_file(Path::new("."), None) {
    Ok(path) => Ok((RunConfig::from_file(&path)?, Some(path))),
    Err(Error::ConfigNotFound(_)) => Ok((RunConfig::default(), None)),
    Err(e) => Err(e),
  }
}
