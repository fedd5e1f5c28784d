//! Merge node: concatenates any number of inputs.

use std::any::Any;

use crate::node::NodeBehavior;
use crate::types::{Output, Parm};
use crate::workspace::CookContext;

/// Multi-arity concatenation in port order.
#[derive(Debug, Clone, Default)]
pub struct Merge;

impl NodeBehavior for Merge {
  fn parm_templates(&self) -> Vec<Parm> {
    vec![
      Parm::toggle("single_string", false),
      Parm::string("separator", "\n"),
    ]
  }

  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    let items: Output = ctx.inputs().into_iter().flatten().collect();
    if !ctx.parm_bool("single_string")? || items.is_empty() {
      return Ok(items);
    }
    let separator = ctx.parm_str("separator")?;
    Ok(vec![items.join(&separator)])
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
