//! Split node: breaks each input item on a delimiter.

use std::any::Any;

use crate::node::NodeBehavior;
use crate::types::{Output, Parm};
use crate::workspace::CookContext;

#[derive(Debug, Clone, Default)]
pub struct Split;

/// Splits every item on `delimiter`. With `strip`, pieces are trimmed and empty ones dropped.
pub(crate) fn split_items(items: &[String], delimiter: &str, strip: bool) -> Output {
  items
    .iter()
    .flat_map(|item| item.split(delimiter))
    .filter_map(|piece| {
      if !strip {
        Some(piece.to_string())
      } else {
        let piece = piece.trim();
        (!piece.is_empty()).then(|| piece.to_string())
      }
    })
    .collect()
}

impl NodeBehavior for Split {
  fn parm_templates(&self) -> Vec<Parm> {
    vec![Parm::string("delimiter", "\n"), Parm::toggle("strip", false)]
  }

  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    let delimiter = ctx.parm_str("delimiter")?;
    if delimiter.is_empty() {
      return Err("delimiter is empty".to_string());
    }
    let strip = ctx.parm_bool("strip")?;
    Ok(split_items(&ctx.input(0), &delimiter, strip))
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
