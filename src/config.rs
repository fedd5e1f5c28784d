//! Engine configuration: defaults, environment overrides.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default directory for staging files written by query agents.
pub const DEFAULT_STAGE_DIR: &str = ".textweave";

pub const ENV_HASH_SIZE_LIMIT: &str = "TEXTWEAVE_HASH_SIZE_LIMIT";
pub const ENV_MAX_ITERATIONS: &str = "TEXTWEAVE_MAX_ITERATIONS";
pub const ENV_AGENT_CMD: &str = "TEXTWEAVE_AGENT_CMD";
pub const ENV_STAGE_DIR: &str = "TEXTWEAVE_STAGE_DIR";

/// Tunables shared by every node of a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Bytes of upstream content hashed by the dirty check. Above it the node is always dirty.
  pub hash_size_limit: usize,
  /// Hard cap on the number of iterations of one looper cook.
  pub max_iterations: usize,
  /// Command run by query nodes that do not set their own `agent_cmd`.
  pub agent_cmd: Option<String>,
  /// Working directory for query agents.
  pub stage_dir: PathBuf,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      hash_size_limit: 1 << 20,
      max_iterations: 10_000,
      agent_cmd: None,
      stage_dir: PathBuf::from(DEFAULT_STAGE_DIR),
    }
  }
}

impl EngineConfig {
  /// Defaults overridden by any `TEXTWEAVE_*` variables that are set.
  pub fn from_env() -> Self {
    Self::default().with_env_overrides()
  }

  /// Applies `TEXTWEAVE_*` variables on top of `self`. Unparsable numbers are ignored with a
  /// warning.
  pub fn with_env_overrides(mut self) -> Self {
    if let Some(limit) = env_number(ENV_HASH_SIZE_LIMIT) {
      self.hash_size_limit = limit;
    }
    if let Some(max) = env_number(ENV_MAX_ITERATIONS) {
      self.max_iterations = max;
    }
    if let Ok(cmd) = env::var(ENV_AGENT_CMD) {
      self.agent_cmd = Some(cmd).filter(|c| !c.trim().is_empty());
    }
    if let Ok(dir) = env::var(ENV_STAGE_DIR) {
      self.stage_dir = PathBuf::from(dir);
    }
    self
  }
}

fn env_number(key: &str) -> Option<usize> {
  let raw = env::var(key).ok()?;
  match raw.trim().parse() {
    Ok(n) => Some(n),
    Err(_) => {
      warn!(key, value = %raw, "ignoring non-numeric setting");
      None
    }
  }
}
