//! Integration tests that run the cook_dot CLI on the .dot fixtures in tests/fixtures/.

use std::path::{Path, PathBuf};
use std::process::Command;

fn fixture(name: &str) -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Runs the cook_dot binary. Returns (stdout, stderr, success).
fn run_cook_dot(args: &[&str]) -> (String, String, bool) {
  run_cook_dot_with_env(args, &[])
}

fn run_cook_dot_with_env(args: &[&str], env: &[(&str, &str)]) -> (String, String, bool) {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_cook_dot"));
  cmd
    .args(args)
    .current_dir(env!("CARGO_MANIFEST_DIR"))
    .env_remove("TEXTWEAVE_AGENT_CMD")
    .env_remove("TEXTWEAVE_STAGE_DIR")
    .env_remove("TEXTWEAVE_MAX_ITERATIONS")
    .env_remove("TEXTWEAVE_HASH_SIZE_LIMIT");
  for (k, v) in env {
    cmd.env(k, v);
  }
  let out = cmd.output().expect("run cook_dot");
  (
    String::from_utf8_lossy(&out.stdout).into_owned(),
    String::from_utf8_lossy(&out.stderr).into_owned(),
    out.status.success(),
  )
}

#[test]
fn cooks_unconnected_outputs_by_default() {
  let path = fixture("items.dot");
  let (stdout, stderr, success) = run_cook_dot(&[path.to_str().expect("path")]);
  assert!(success, "items.dot should succeed: stderr={stderr}");
  assert!(stdout.contains("/joined:"), "stdout={stdout}");
  assert!(stdout.contains("  Item 1, Item 2, Item 3"), "stdout={stdout}");
}

#[test]
fn set_overrides_graph_globals() {
  let path = fixture("items.dot");
  let (stdout, stderr, success) =
    run_cook_dot(&["--set", "COUNT=5", path.to_str().expect("path")]);
  assert!(success, "stderr={stderr}");
  assert!(stdout.contains("Item 5"), "stdout={stdout}");
}

#[test]
fn named_targets_are_cooked() {
  let path = fixture("filter.dot");
  let (stdout, stderr, success) = run_cook_dot(&[path.to_str().expect("path"), "rest"]);
  assert!(success, "stderr={stderr}");
  assert!(stdout.contains("/rest:\n  banana\n  cherry\n"), "stdout={stdout}");
  assert!(!stdout.contains("/only_a:"));
}

#[test]
fn iteration_cap_from_env() {
  let path = fixture("items.dot");
  let (stdout, _, success) = run_cook_dot_with_env(
    &[path.to_str().expect("path")],
    &[("TEXTWEAVE_MAX_ITERATIONS", "2")],
  );
  assert!(success);
  assert!(stdout.contains("  Item 1, Item 2\n"), "stdout={stdout}");
}

#[test]
fn cook_errors_exit_nonzero() {
  let path = fixture("broken.dot");
  let (stdout, _, success) = run_cook_dot(&[path.to_str().expect("path")]);
  assert!(!success);
  assert!(stdout.contains("error: delimiter is empty"), "stdout={stdout}");
}

#[test]
fn unknown_target_fails() {
  let path = fixture("filter.dot");
  let (_, stderr, success) = run_cook_dot(&[path.to_str().expect("path"), "nothing"]);
  assert!(!success);
  assert!(stderr.contains("no node named nothing"), "stderr={stderr}");
}

#[test]
fn missing_file_fails() {
  let (_, stderr, success) = run_cook_dot(&["tests/fixtures/does-not-exist.dot"]);
  assert!(!success);
  assert!(stderr.contains("Error reading"), "stderr={stderr}");
}

#[cfg(unix)]
#[test]
fn agent_cmd_flag_runs_query_nodes() {
  let stage = tempfile::tempdir().expect("tempdir");
  let path = fixture("query.dot");
  let (stdout, stderr, success) = run_cook_dot(&[
    "--agent-cmd",
    "cat",
    "--stage-dir",
    stage.path().to_str().expect("stage"),
    path.to_str().expect("path"),
  ]);
  assert!(success, "stderr={stderr}");
  assert!(stdout.contains("/ask:\n  hello agent\n"), "stdout={stdout}");
}

#[cfg(unix)]
#[test]
fn agent_cmd_env_overrides_flag() {
  let stage = tempfile::tempdir().expect("tempdir");
  let path = fixture("query.dot");
  let (stdout, stderr, success) = run_cook_dot_with_env(
    &[
      "--agent-cmd",
      "textweave-no-such-agent",
      "--stage-dir",
      stage.path().to_str().expect("stage"),
      path.to_str().expect("path"),
    ],
    &[("TEXTWEAVE_AGENT_CMD", "cat")],
  );
  assert!(success, "stderr={stderr}");
  assert!(stdout.contains("  hello agent"), "stdout={stdout}");
}
