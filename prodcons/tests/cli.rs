use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn run_binary(config: &Path) -> Output {
  Command::new(env!("CARGO_BIN_EXE_prodcons"))
    .arg(config)
    .env_remove("RUST_LOG")
    .output()
    .expect("failed to launch prodcons binary")
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
  let path = dir.join("prodcons.yaml");
  fs::write(&path, body).unwrap();
  path
}

#[test]
fn clean_run_exits_zero() {
  let dir = tempfile::tempdir().unwrap();
  let path = write_config(dir.path(), "capacity: 4\nitem_count: 3\ndelay:\n  enabled: false\n");

  let output = run_binary(&path);
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  for line in ["0 --->", "1 --->", "2 --->", "---> 0", "---> 1", "---> 2"] {
    assert!(stdout.lines().any(|l| l == line), "missing {:?} in {:?}", line, stdout);
  }
  assert!(!stdout.contains("-1"), "sentinel was printed: {:?}", stdout);
}

#[test]
fn invalid_capacity_exits_nonzero() {
  let dir = tempfile::tempdir().unwrap();
  let path = write_config(dir.path(), "capacity: 1\ndelay:\n  enabled: false\n");

  let output = run_binary(&path);
  assert_eq!(output.status.code(), Some(1));
  assert!(output.stdout.is_empty());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("prodcons:") && stderr.contains("capacity"), "stderr: {}", stderr);
}

#[test]
fn missing_config_path_exits_nonzero() {
  let dir = tempfile::tempdir().unwrap();
  let output = run_binary(&dir.path().join("absent.yaml"));
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("configuration file"), "stderr: {}", stderr);
}

#[test]
fn unknown_field_exits_nonzero() {
  let dir = tempfile::tempdir().unwrap();
  let path = write_config(dir.path(), "buffer_size: 4\n");

  let output = run_binary(&path);
  assert_eq!(output.status.code(), Some(1));
}
