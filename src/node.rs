//! Graph vertex and the behavior contract node kinds implement.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use dyn_clone::DynClone;
use serde_json::Value;
use sha2::Sha256;

use crate::types::{
  ConnectionId, NodeId, NodeState, NodeType, Output, Parm, TEXT_LIST, UiState,
};
use crate::workspace::{CookContext, HashContext};

/// Kind-specific part of a node.
///
/// The workspace owns the generic bookkeeping (ports, parms, state, cache); a behavior only
/// declares its ports and parms and computes an output from a [CookContext].
pub trait NodeBehavior: DynClone + fmt::Debug {
  fn input_labels(&self) -> Vec<String> {
    vec!["input".to_string()]
  }

  fn output_labels(&self) -> Vec<String> {
    vec!["output".to_string()]
  }

  fn parm_templates(&self) -> Vec<Parm> {
    Vec::new()
  }

  /// Computes the node's output. Upstream inputs are already cooked.
  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String>;

  /// Adds kind-specific inputs to the dirty-check digest.
  fn extend_hash(&self, _ctx: &HashContext<'_>, _hasher: &mut Sha256) {}

  /// Public names of kind-specific persisted fields.
  fn state_fields(&self) -> &'static [&'static str] {
    &[]
  }

  fn state_field(&self, _name: &str) -> Option<Value> {
    None
  }

  fn set_state_field(&mut self, name: &str, _value: &Value) -> Result<(), String> {
    Err(format!("unknown field {name}"))
  }

  fn as_composite(&self) -> Option<&dyn Composite> {
    None
  }

  fn as_any(&self) -> &dyn Any;

  fn as_any_mut(&mut self) -> &mut dyn Any;
}

dyn_clone::clone_trait_object!(NodeBehavior);

/// Capability of node kinds that own child nodes.
pub trait Composite {
  /// Children created together with the composite and never removed on their own.
  fn permanent_children(&self) -> &'static [(&'static str, NodeType)];
}

/// A graph vertex.
#[derive(Debug, Clone)]
pub struct Node {
  id: NodeId,
  pub(crate) path: String,
  node_type: NodeType,
  pub ui: UiState,
  pub(crate) enabled: bool,
  pub(crate) state: NodeState,
  pub(crate) composite: bool,
  pub(crate) permanent: bool,
  input_labels: Vec<String>,
  output_labels: Vec<String>,
  pub(crate) inputs: BTreeMap<usize, ConnectionId>,
  pub(crate) outputs: BTreeMap<usize, Vec<ConnectionId>>,
  pub(crate) parms: Vec<Parm>,
  pub(crate) cook_count: u64,
  pub(crate) last_cook_time: f64,
  pub(crate) last_cooked_at: Option<DateTime<Utc>>,
  pub(crate) errors: Vec<String>,
  pub(crate) warnings: Vec<String>,
  pub(crate) output: Output,
  pub(crate) last_hash: Option<String>,
  pub(crate) behavior: Option<Box<dyn NodeBehavior>>,
}

impl Node {
  pub(crate) fn new(path: String, node_type: NodeType, behavior: Box<dyn NodeBehavior>) -> Self {
    Self {
      id: NodeId::next(),
      path,
      node_type,
      ui: UiState::default(),
      enabled: true,
      state: NodeState::Uncooked,
      composite: behavior.as_composite().is_some(),
      permanent: false,
      input_labels: behavior.input_labels(),
      output_labels: behavior.output_labels(),
      inputs: BTreeMap::new(),
      outputs: BTreeMap::new(),
      parms: behavior.parm_templates(),
      cook_count: 0,
      last_cook_time: 0.0,
      last_cooked_at: None,
      errors: Vec::new(),
      warnings: Vec::new(),
      output: Vec::new(),
      last_hash: None,
      behavior: Some(behavior),
    }
  }

  pub fn session_id(&self) -> NodeId {
    self.id
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn name(&self) -> &str {
    crate::workspace::path_name(&self.path)
  }

  pub fn parent_path(&self) -> &str {
    crate::workspace::parent_path(&self.path)
  }

  pub fn node_type(&self) -> NodeType {
    self.node_type
  }

  pub fn state(&self) -> NodeState {
    self.state
  }

  pub fn enabled(&self) -> bool {
    self.enabled
  }

  pub fn is_composite(&self) -> bool {
    self.composite
  }

  /// True for children created by a composite; they go away only with their parent.
  pub fn is_permanent(&self) -> bool {
    self.permanent
  }

  pub fn errors(&self) -> &[String] {
    &self.errors
  }

  pub fn warnings(&self) -> &[String] {
    &self.warnings
  }

  pub fn cook_count(&self) -> u64 {
    self.cook_count
  }

  /// Duration of the last cook in milliseconds.
  pub fn last_cook_time(&self) -> f64 {
    self.last_cook_time
  }

  pub fn last_cooked_at(&self) -> Option<DateTime<Utc>> {
    self.last_cooked_at
  }

  pub fn parms(&self) -> &[Parm] {
    &self.parms
  }

  pub fn parm(&self, name: &str) -> Option<&Parm> {
    self.parms.iter().find(|p| p.name() == name)
  }

  pub(crate) fn parm_mut(&mut self, name: &str) -> Option<&mut Parm> {
    self.parms.iter_mut().find(|p| p.name() == name)
  }

  pub fn inputs(&self) -> &BTreeMap<usize, ConnectionId> {
    &self.inputs
  }

  pub fn outputs(&self) -> &BTreeMap<usize, Vec<ConnectionId>> {
    &self.outputs
  }

  /// Cached output of the last successful cook.
  pub fn cached_output(&self) -> &Output {
    &self.output
  }

  pub fn behavior(&self) -> Option<&dyn NodeBehavior> {
    self.behavior.as_deref()
  }

  /// Input ports by index.
  ///
  /// Multi-arity kinds report `0..=k` for `k` connected inputs: every connected port plus
  /// one open port.
  pub fn input_names(&self) -> BTreeMap<usize, String> {
    match self.node_type.arity() {
      crate::types::Arity::Single => self.input_labels.iter().cloned().enumerate().collect(),
      crate::types::Arity::Multi => (0..=self.inputs.len())
        .map(|i| (i, format!("input {i}")))
        .collect(),
    }
  }

  pub fn output_names(&self) -> BTreeMap<usize, String> {
    self.output_labels.iter().cloned().enumerate().collect()
  }

  pub fn input_data_types(&self) -> BTreeMap<usize, String> {
    self
      .input_names()
      .into_keys()
      .map(|i| (i, TEXT_LIST.to_string()))
      .collect()
  }

  pub fn output_data_types(&self) -> BTreeMap<usize, String> {
    self
      .output_names()
      .into_keys()
      .map(|i| (i, TEXT_LIST.to_string()))
      .collect()
  }

  pub(crate) fn output_port_count(&self) -> usize {
    self.output_labels.len()
  }

  pub(crate) fn input_port_count(&self) -> usize {
    self.input_labels.len()
  }

  pub(crate) fn invalidate(&mut self) {
    if self.state != NodeState::Cooking {
      self.state = NodeState::Uncooked;
    }
  }

  pub(crate) fn warn(&mut self, message: impl Into<String>) {
    let message = message.into();
    if !self.warnings.contains(&message) {
      self.warnings.push(message);
    }
  }

  pub(crate) fn error(&mut self, message: impl Into<String>) {
    let message = message.into();
    if !self.errors.contains(&message) {
      self.errors.push(message);
    }
  }
}
