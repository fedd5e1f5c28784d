//! Text node: emits an evaluated string after its input items.

use std::any::Any;

use tracing::trace;

use crate::node::NodeBehavior;
use crate::types::{Output, Parm};
use crate::workspace::CookContext;

/// Source of literal or templated text.
///
/// Output is the input items (when `pass_through` is on) followed by the evaluated
/// `text_string`. An empty evaluated string adds no item.
#[derive(Debug, Clone, Default)]
pub struct Text;

impl NodeBehavior for Text {
  fn parm_templates(&self) -> Vec<Parm> {
    vec![
      Parm::string("text_string", ""),
      Parm::toggle("pass_through", true),
    ]
  }

  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    let mut output = if ctx.parm_bool("pass_through")? {
      ctx.input(0)
    } else {
      Vec::new()
    };
    let text = ctx.parm_str("text_string")?;
    trace!(node = %ctx.node_id(), text = %text, "text evaluated");
    if !text.is_empty() {
      output.push(text);
    }
    Ok(output)
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
