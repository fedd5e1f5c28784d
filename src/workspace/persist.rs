//! Attribute mapping used by external persistence.
//!
//! Every persistable field has a public name. Generic node fields go through [NODE_FIELDS],
//! parms are addressed by name, and kind-specific fields through the behavior's state field
//! list. Unknown names are skipped with a warning so older or newer files still load.

use serde_json::{Map, Value, json};
use tracing::{instrument, warn};

use super::Workspace;
use crate::error::GraphResult;
use crate::node::Node;
use crate::types::{NodeId, ParmType, ParmValue};

/// Generic node fields that persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
  Type,
  Position,
  Color,
  Selected,
  Enabled,
}

/// Public name to field allow-list shared by every node kind.
pub const NODE_FIELDS: &[(&str, NodeField)] = &[
  ("type", NodeField::Type),
  ("pos", NodeField::Position),
  ("color", NodeField::Color),
  ("selected", NodeField::Selected),
  ("enabled", NodeField::Enabled),
];

fn node_field(name: &str) -> Option<NodeField> {
  NODE_FIELDS
    .iter()
    .find(|(public, _)| *public == name)
    .map(|(_, field)| *field)
}

impl Node {
  /// Persistable fields keyed by public name.
  pub fn attributes(&self) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, field) in NODE_FIELDS {
      let value = match field {
        NodeField::Type => json!(self.node_type().as_str()),
        NodeField::Position => json!([self.ui.position.0, self.ui.position.1]),
        NodeField::Color => self.ui.color.clone().map(Value::String).unwrap_or(Value::Null),
        NodeField::Selected => json!(self.ui.selected),
        NodeField::Enabled => json!(self.enabled),
      };
      map.insert(name.to_string(), value);
    }
    for parm in self.parms.iter().filter(|p| p.parm_type() != ParmType::Button) {
      map.insert(parm.name().to_string(), parm.raw().to_json());
    }
    if let Some(behavior) = self.behavior() {
      for name in behavior.state_fields() {
        if let Some(value) = behavior.state_field(name) {
          map.insert(name.to_string(), value);
        }
      }
    }
    map
  }
}

impl Workspace {
  /// Applies persisted attributes to `id`. Returns a warning per skipped attribute.
  #[instrument(level = "trace", skip(self, attributes))]
  pub fn apply_attributes(
    &mut self,
    id: NodeId,
    attributes: &Map<String, Value>,
  ) -> GraphResult<Vec<String>> {
    let mut skipped = Vec::new();
    for (name, value) in attributes {
      if let Err(message) = self.apply_attribute(id, name, value) {
        skipped.push(format!("{name}: {message}"));
      }
    }
    let node = self.node_entry(id)?;
    for message in &skipped {
      warn!(path = %node.path, "attribute skipped: {message}");
      node.warn(format!("attribute skipped: {message}"));
    }
    node.invalidate();
    Ok(skipped)
  }

  fn apply_attribute(&mut self, id: NodeId, name: &str, value: &Value) -> Result<(), String> {
    let node = self.node_entry(id).map_err(|e| e.to_string())?;
    if let Some(field) = node_field(name) {
      return match (field, value) {
        (NodeField::Type, Value::String(t)) if t.as_str() == node.node_type().as_str() => Ok(()),
        (NodeField::Type, other) => Err(format!(
          "type {other} does not match {}",
          node.node_type()
        )),
        (NodeField::Position, Value::Array(xy)) if xy.len() == 2 => {
          match (xy[0].as_f64(), xy[1].as_f64()) {
            (Some(x), Some(y)) => {
              node.ui.position = (x, y);
              Ok(())
            }
            _ => Err("expected two numbers".to_string()),
          }
        }
        (NodeField::Color, Value::String(c)) => {
          node.ui.color = Some(c.clone());
          Ok(())
        }
        (NodeField::Color, Value::Null) => {
          node.ui.color = None;
          Ok(())
        }
        (NodeField::Selected, Value::Bool(b)) => {
          node.ui.selected = *b;
          Ok(())
        }
        (NodeField::Enabled, Value::Bool(b)) => {
          node.enabled = *b;
          Ok(())
        }
        (_, other) => Err(format!("unexpected value {other}")),
      };
    }
    if let Some(parm) = node.parm_mut(name) {
      let parsed = ParmValue::from_json(parm.parm_type(), value)?;
      return parm.set(parsed);
    }
    match node.behavior.as_mut() {
      Some(behavior) if behavior.state_fields().iter().any(|f| *f == name) => {
        behavior.set_state_field(name, value)
      }
      _ => Err("unknown attribute".to_string()),
    }
  }
}
