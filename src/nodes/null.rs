//! Null node: forwards input 0 unchanged.

use std::any::Any;

use crate::node::NodeBehavior;
use crate::types::Output;
use crate::workspace::CookContext;

/// Pass-through node, used as a named tap point in a graph.
#[derive(Debug, Clone, Default)]
pub struct Null;

impl NodeBehavior for Null {
  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    Ok(ctx.input(0))
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
