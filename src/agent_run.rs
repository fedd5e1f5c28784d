//! Agent invocation: run the agent command with the prompt on stdin and collect stdout.
//! Used by the Query node.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, instrument};

use crate::config::ENV_STAGE_DIR;

/// Runs `agent_cmd` (split on whitespace) with `prompt` as stdin and returns its stdout with
/// trailing whitespace removed. The stage directory is created and passed to the agent in
/// `TEXTWEAVE_STAGE_DIR`.
#[instrument(level = "trace", skip(agent_cmd, prompt, stage_dir))]
pub(crate) fn run_agent(agent_cmd: &str, prompt: &str, stage_dir: &Path) -> Result<String, String> {
  let parts: Vec<&str> = agent_cmd.split_whitespace().collect();
  let (bin, args) = match parts.split_first() {
    Some((b, a)) => (b, a),
    None => return Err("agent_cmd is empty".to_string()),
  };
  fs::create_dir_all(stage_dir).map_err(|e| format!("stage dir {}: {e}", stage_dir.display()))?;

  let mut child = Command::new(bin)
    .args(args)
    .env(ENV_STAGE_DIR, stage_dir)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::inherit())
    .spawn()
    .map_err(|e| format!("agent spawn: {e}"))?;
  if let Some(mut stdin) = child.stdin.take() {
    let written = stdin
      .write_all(prompt.as_bytes())
      .and_then(|_| stdin.write_all(b"\n"));
    drop(stdin);
    if let Err(e) = written {
      // reap the child before bailing out
      let _ = child.kill();
      let _ = child.wait();
      debug!(error = %e, "agent stdin closed early");
      return Err(format!("agent stdin: {e}"));
    }
  }
  let output = child
    .wait_with_output()
    .map_err(|e| format!("agent wait: {e}"))?;
  if !output.status.success() {
    return Err(
      output
        .status
        .code()
        .map(|c| format!("agent exit {c}"))
        .unwrap_or_else(|| "agent signal".to_string()),
    );
  }
  let response = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
  debug!(bytes = response.len(), "agent responded");
  Ok(response)
}
