//! Iteration state of running loopers, keyed by looper path.

use std::collections::HashMap;

use tracing::trace;

/// Maps a looper path to its current iteration value while that looper cooks.
///
/// An entry exists from [LoopManager::start_loop] until [LoopManager::clean_stale]. Entries
/// hold `None` between loop start and the first iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopManager {
  loops: HashMap<String, Option<i64>>,
  /// Paths of running loops in start order; the last one is the innermost.
  active: Vec<String>,
}

impl LoopManager {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn start_loop(&mut self, path: &str) {
    trace!(path, "loop start");
    self.loops.insert(path.to_string(), None);
    self.active.retain(|p| p != path);
    self.active.push(path.to_string());
  }

  /// Records the current iteration value for `path`, starting the loop if needed.
  pub fn set_loop(&mut self, path: &str, value: i64) {
    if !self.loops.contains_key(path) {
      self.start_loop(path);
    }
    trace!(path, value, "loop iteration");
    self.loops.insert(path.to_string(), Some(value));
  }

  pub fn get_loop(&self, path: &str) -> Option<i64> {
    self.loops.get(path).copied().flatten()
  }

  pub fn is_active(&self, path: &str) -> bool {
    self.loops.contains_key(path)
  }

  /// Value of the most recently started loop that has an iteration value.
  pub fn innermost(&self) -> Option<i64> {
    self
      .active
      .iter()
      .rev()
      .find_map(|p| self.loops.get(p).copied().flatten())
  }

  /// Removes the entry for `path`; `$$N` no longer resolves for it.
  pub fn clean_stale(&mut self, path: &str) {
    trace!(path, "loop end");
    self.loops.remove(path);
    self.active.retain(|p| p != path);
  }

  pub fn active_paths(&self) -> &[String] {
    &self.active
  }

  pub fn clear(&mut self) {
    self.loops.clear();
    self.active.clear();
  }
}
