//! The workspace: one graph with its globals and loop state.
//!
//! Everything that would otherwise be process-wide state (path registry, connections,
//! global store, loop manager) lives here, so several independent graphs can coexist and a
//! whole graph can be snapshotted and restored in one step.

mod connect;
mod context;
mod cook;
#[cfg(test)]
mod cook_test;
mod persist;
mod registry;
#[cfg(test)]
mod registry_test;
mod snapshot;

use std::collections::{BTreeMap, HashMap};

pub use context::{CookContext, HashContext};
pub use persist::{NODE_FIELDS, NodeField};
pub use registry::RegistryEvent;
pub use snapshot::WorkspaceSnapshot;

use crate::config::EngineConfig;
use crate::error::{GraphError, GraphResult};
use crate::globals::GlobalStore;
use crate::loops::LoopManager;
use crate::node::Node;
use crate::types::{Connection, ConnectionId, NodeId};

/// Path of the implicit root every top-level node lives under.
pub const ROOT_PATH: &str = "/";

/// One node graph plus its globals and loop state.
#[derive(Debug, Default)]
pub struct Workspace {
  nodes: HashMap<NodeId, Node>,
  paths: BTreeMap<String, NodeId>,
  connections: HashMap<ConnectionId, Connection>,
  globals: GlobalStore,
  loops: LoopManager,
  config: EngineConfig,
  events: Vec<RegistryEvent>,
  /// Depth of nested `create_node` calls; events are emitted only at depth zero.
  registering: usize,
}

impl Workspace {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_config(config: EngineConfig) -> Self {
    Self {
      config,
      ..Self::default()
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn config_mut(&mut self) -> &mut EngineConfig {
    &mut self.config
  }

  pub fn globals(&self) -> &GlobalStore {
    &self.globals
  }

  /// Mutable access to the globals. Nodes whose parms reference a changed global become
  /// dirty through their content hash.
  pub fn globals_mut(&mut self) -> &mut GlobalStore {
    &mut self.globals
  }

  pub fn loops(&self) -> &LoopManager {
    &self.loops
  }

  pub(crate) fn loops_mut(&mut self) -> &mut LoopManager {
    &mut self.loops
  }

  pub fn node(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(&id)
  }

  pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
    self.nodes.get_mut(&id)
  }

  pub fn node_by_path(&self, path: &str) -> Option<&Node> {
    self.paths.get(path).and_then(|id| self.nodes.get(id))
  }

  /// Session id of the node at `path`.
  pub fn id_of(&self, path: &str) -> GraphResult<NodeId> {
    self
      .paths
      .get(path)
      .copied()
      .ok_or_else(|| GraphError::NodeNotFound(path.to_string()))
  }

  pub fn nodes(&self) -> impl Iterator<Item = &Node> {
    self.paths.values().filter_map(|id| self.nodes.get(id))
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Takes the registry events accumulated since the last call.
  pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
    std::mem::take(&mut self.events)
  }

  pub(crate) fn node_ref(&self, id: NodeId) -> GraphResult<&Node> {
    self
      .nodes
      .get(&id)
      .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
  }

  pub(crate) fn node_entry(&mut self, id: NodeId) -> GraphResult<&mut Node> {
    self
      .nodes
      .get_mut(&id)
      .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
  }

  /// Downcasts the behavior of `id` to a concrete node kind.
  pub fn behavior<T: 'static>(&self, id: NodeId) -> Option<&T> {
    self
      .nodes
      .get(&id)?
      .behavior
      .as_deref()?
      .as_any()
      .downcast_ref::<T>()
  }

  pub fn behavior_mut<T: 'static>(&mut self, id: NodeId) -> Option<&mut T> {
    self
      .nodes
      .get_mut(&id)?
      .behavior
      .as_deref_mut()?
      .as_any_mut()
      .downcast_mut::<T>()
  }
}

/// Last segment of a path.
pub fn path_name(path: &str) -> &str {
  path.rsplit('/').next().unwrap_or(path)
}

/// Everything before the last segment; `/` for top-level nodes.
pub fn parent_path(path: &str) -> &str {
  match path.rfind('/') {
    Some(0) | None => ROOT_PATH,
    Some(i) => &path[..i],
  }
}

pub fn join_path(parent: &str, name: &str) -> String {
  if parent == ROOT_PATH {
    format!("/{name}")
  } else {
    format!("{parent}/{name}")
  }
}

/// Makes `path` absolute and strips trailing slashes.
pub fn normalize_path(path: &str) -> String {
  let trimmed = path.trim().trim_end_matches('/');
  if trimmed.is_empty() {
    ROOT_PATH.to_string()
  } else if trimmed.starts_with('/') {
    trimmed.to_string()
  } else {
    format!("/{trimmed}")
  }
}

/// True if `path` is `ancestor` or lies below it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
  ancestor == ROOT_PATH
    || path == ancestor
    || (path.starts_with(ancestor) && path[ancestor.len()..].starts_with('/'))
}
