//! Views of the workspace handed to node behaviors while cooking and hashing.

use super::Workspace;
use crate::config::EngineConfig;
use crate::expression::{EvalContext, LoopScope};
use crate::node::Node;
use crate::types::{NodeId, Output, ParmValue};

/// Mutable view of the workspace for one node's cook.
///
/// The node's own behavior is detached while it cooks, so the context can hand out the
/// whole workspace (loopers drive their body through it).
pub struct CookContext<'a> {
  ws: &'a mut Workspace,
  node: NodeId,
}

impl<'a> CookContext<'a> {
  pub(crate) fn new(ws: &'a mut Workspace, node: NodeId) -> Self {
    Self { ws, node }
  }

  pub fn node_id(&self) -> NodeId {
    self.node
  }

  pub fn path(&self) -> String {
    self
      .ws
      .node(self.node)
      .map(|n| n.path().to_string())
      .unwrap_or_default()
  }

  pub fn workspace(&mut self) -> &mut Workspace {
    &mut *self.ws
  }

  pub fn workspace_ref(&self) -> &Workspace {
    &*self.ws
  }

  pub fn config(&self) -> &EngineConfig {
    self.ws.config()
  }

  /// Loop indices visible from this node.
  pub fn scope(&self) -> LoopScope {
    self.ws.loop_scope(self.node)
  }

  pub fn has_input(&self, index: usize) -> bool {
    self.ws.input_connection(self.node, index).is_some()
  }

  /// Cached output feeding input `index`; empty when unconnected.
  pub fn input(&self, index: usize) -> Output {
    self
      .ws
      .input_connection(self.node, index)
      .and_then(|c| self.ws.node(c.source()))
      .map(|n| n.cached_output().clone())
      .unwrap_or_default()
  }

  /// Outputs of every connected input in port order.
  pub fn inputs(&self) -> Vec<Output> {
    self
      .ws
      .input_sources(self.node)
      .into_iter()
      .filter_map(|(_, source, _)| self.ws.node(source))
      .map(|n| n.cached_output().clone())
      .collect()
  }

  /// Evaluates a parm, recording unresolved tokens as warnings on the node.
  pub fn parm(&mut self, name: &str) -> Result<ParmValue, String> {
    let evaluated = {
      let node = self
        .ws
        .node(self.node)
        .ok_or_else(|| format!("node {} vanished while cooking", self.node))?;
      let parm = node
        .parm(name)
        .ok_or_else(|| format!("parm {name} not found"))?;
      let ctx = EvalContext::new(self.ws.globals(), self.ws.loop_scope(self.node));
      parm.eval(&ctx)
    };
    for diagnostic in evaluated.diagnostics {
      self.warn(format!("{name}: {diagnostic}"));
    }
    Ok(evaluated.value)
  }

  pub fn parm_str(&mut self, name: &str) -> Result<String, String> {
    match self.parm(name)? {
      ParmValue::Str(s) => Ok(s),
      ParmValue::Int(i) => Ok(i.to_string()),
      other => Err(format!("{name}: expected a string, got {other:?}")),
    }
  }

  pub fn parm_int(&mut self, name: &str) -> Result<i64, String> {
    match self.parm(name)? {
      ParmValue::Int(i) => Ok(i),
      ParmValue::Str(s) => Err(format!("{name}: {s:?} is not an integer")),
      other => Err(format!("{name}: expected an integer, got {other:?}")),
    }
  }

  pub fn parm_bool(&mut self, name: &str) -> Result<bool, String> {
    self
      .parm(name)?
      .as_bool()
      .ok_or_else(|| format!("{name}: expected a toggle"))
  }

  pub fn warn(&mut self, message: impl Into<String>) {
    if let Some(node) = self.ws.node_mut(self.node) {
      node.warn(message);
    }
  }
}

/// Read-only view used by [crate::node::NodeBehavior::extend_hash].
pub struct HashContext<'a> {
  pub ws: &'a Workspace,
  pub node: &'a Node,
  pub scope: LoopScope,
}

impl HashContext<'_> {
  /// Evaluated string value of a parm, ignoring diagnostics.
  pub fn parm_str(&self, name: &str) -> Option<String> {
    let ctx = EvalContext::new(self.ws.globals(), self.scope);
    match self.node.parm(name)?.eval(&ctx).value {
      ParmValue::Str(s) => Some(s),
      ParmValue::Int(i) => Some(i.to_string()),
      _ => None,
    }
  }
}
