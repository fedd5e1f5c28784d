//! Whole-workspace snapshots.

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use super::Workspace;
use crate::globals::GlobalStore;
use crate::loops::LoopManager;
use crate::node::Node;
use crate::types::{Connection, ConnectionId, NodeId};

/// Deep copy of a workspace's registry, connections, globals and loop state.
#[derive(Debug, Clone)]
pub struct WorkspaceSnapshot {
  nodes: HashMap<NodeId, Node>,
  paths: BTreeMap<String, NodeId>,
  connections: HashMap<ConnectionId, Connection>,
  globals: GlobalStore,
  loops: LoopManager,
}

impl WorkspaceSnapshot {
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn globals(&self) -> &GlobalStore {
    &self.globals
  }
}

impl Workspace {
  pub fn snapshot(&self) -> WorkspaceSnapshot {
    WorkspaceSnapshot {
      nodes: self.nodes.clone(),
      paths: self.paths.clone(),
      connections: self.connections.clone(),
      globals: self.globals.clone(),
      loops: self.loops.clone(),
    }
  }

  /// Replaces the whole state with `snapshot`. Pending events are dropped.
  pub fn restore(&mut self, snapshot: WorkspaceSnapshot) {
    info!(nodes = snapshot.nodes.len(), "workspace restored");
    self.nodes = snapshot.nodes;
    self.paths = snapshot.paths;
    self.connections = snapshot.connections;
    self.globals = snapshot.globals;
    self.loops = snapshot.loops;
    self.events.clear();
  }

  /// Empties nodes, connections, globals, loops and pending events. Configuration is kept.
  pub fn reset(&mut self) {
    self.nodes.clear();
    self.paths.clear();
    self.connections.clear();
    self.globals.clear();
    self.loops.clear();
    self.events.clear();
    self.registering = 0;
  }
}
