//! Json node: extracts a dotted path from each input item.

use std::any::Any;

use serde_json::Value;

use crate::node::NodeBehavior;
use crate::types::{Output, Parm};
use crate::workspace::CookContext;

#[derive(Debug, Clone, Default)]
pub struct Json;

/// Follows `a.b.0.c` through objects and arrays. An empty path selects the whole value.
pub(crate) fn extract<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
  path
    .split('.')
    .filter(|segment| !segment.is_empty())
    .try_fold(value, |current, segment| match current {
      Value::Object(map) => map.get(segment),
      Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
      _ => None,
    })
}

impl NodeBehavior for Json {
  fn parm_templates(&self) -> Vec<Parm> {
    vec![Parm::string("path", "")]
  }

  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    let path = ctx.parm_str("path")?;
    let mut output = Vec::new();
    for (i, item) in ctx.input(0).iter().enumerate() {
      let value: Value =
        serde_json::from_str(item).map_err(|e| format!("item {i}: invalid JSON: {e}"))?;
      match extract(&value, &path) {
        Some(Value::String(s)) => output.push(s.clone()),
        Some(other) => output.push(other.to_string()),
        None => ctx.warn(format!("item {i}: path {path:?} not found")),
      }
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
