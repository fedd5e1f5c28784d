//! Relay nodes living inside a looper: the loop body's entry and exit.

use std::any::Any;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::node::NodeBehavior;
use crate::types::Output;
use crate::workspace::{CookContext, HashContext};

/// Entry of a loop body. Emits whatever its looper fed it for the current iteration.
///
/// Outside a looper cook (no feed yet) it reads the looper's own input through the cache,
/// without cooking anything.
#[derive(Debug, Clone, Default)]
pub struct InputRelay {
  feed: Option<Output>,
}

impl InputRelay {
  pub(crate) fn set_feed(&mut self, feed: Output) {
    self.feed = Some(feed);
  }

  pub fn feed(&self) -> Option<&Output> {
    self.feed.as_ref()
  }
}

impl NodeBehavior for InputRelay {
  fn input_labels(&self) -> Vec<String> {
    Vec::new()
  }

  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    if let Some(feed) = &self.feed {
      return Ok(feed.clone());
    }
    let ws = ctx.workspace_ref();
    let looper = ws
      .node(ctx.node_id())
      .map(|n| n.parent_path().to_string())
      .and_then(|parent| ws.id_of(&parent).ok())
      .ok_or_else(|| "input relay has no looper".to_string())?;
    Ok(ws.upstream_output(looper, 0))
  }

  fn extend_hash(&self, _ctx: &HashContext<'_>, hasher: &mut Sha256) {
    if let Some(feed) = &self.feed {
      for item in feed {
        hasher.update(item.len().to_le_bytes());
        hasher.update(item.as_bytes());
      }
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}

/// Exit of a loop body. Its cooked output is the current iteration's slice; the looper
/// appends each slice to the accumulator.
#[derive(Debug, Clone, Default)]
pub struct OutputRelay {
  accumulated: Output,
}

impl OutputRelay {
  pub fn accumulated(&self) -> &Output {
    &self.accumulated
  }

  pub(crate) fn reset(&mut self) {
    self.accumulated.clear();
  }

  pub(crate) fn extend(&mut self, items: Output) {
    self.accumulated.extend(items);
  }
}

impl NodeBehavior for OutputRelay {
  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    Ok(ctx.input(0))
  }

  fn state_fields(&self) -> &'static [&'static str] {
    &["accumulated"]
  }

  fn state_field(&self, name: &str) -> Option<Value> {
    (name == "accumulated").then(|| Value::from(self.accumulated.clone()))
  }

  fn set_state_field(&mut self, name: &str, value: &Value) -> Result<(), String> {
    if name != "accumulated" {
      return Err(format!("unknown field {name}"));
    }
    self.accumulated = serde_json::from_value(value.clone())
      .map_err(|e| format!("accumulated: expected a list of strings: {e}"))?;
    Ok(())
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
