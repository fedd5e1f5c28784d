//! Search node: regex filter over input items.

use std::any::Any;

use regex::RegexBuilder;

use crate::node::NodeBehavior;
use crate::types::{Output, Parm};
use crate::workspace::CookContext;

#[derive(Debug, Clone, Default)]
pub struct Search;

impl NodeBehavior for Search {
  fn parm_templates(&self) -> Vec<Parm> {
    vec![
      Parm::string("pattern", ""),
      Parm::toggle("invert", false),
      Parm::toggle("ignore_case", false),
    ]
  }

  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    let pattern = ctx.parm_str("pattern")?;
    let invert = ctx.parm_bool("invert")?;
    let regex = RegexBuilder::new(&pattern)
      .case_insensitive(ctx.parm_bool("ignore_case")?)
      .build()
      .map_err(|e| format!("invalid pattern {pattern:?}: {e}"))?;
    Ok(
      ctx
        .input(0)
        .into_iter()
        .filter(|item| regex.is_match(item) != invert)
        .collect(),
    )
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
