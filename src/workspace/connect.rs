//! Connection management: wiring, replacement, removal and reachability.

use std::collections::HashSet;

use tracing::{debug, instrument};

use super::{Workspace, join_path};
use crate::error::{GraphError, GraphResult};
use crate::types::{Arity, Connection, ConnectionId, NodeId, NodeType};

impl Workspace {
  /// Connects output `output_index` of `source` to input `input_index` of `dest`.
  ///
  /// Single-arity ports hold one connection: an existing one is replaced with a warning on
  /// `dest`. Multi-arity kinds accept any index up to the number of connected inputs.
  /// Rejects connections that would close a cycle.
  #[instrument(level = "trace", skip(self))]
  pub fn set_input(
    &mut self,
    dest: NodeId,
    input_index: usize,
    source: NodeId,
    output_index: usize,
  ) -> GraphResult<ConnectionId> {
    let src = self.node_ref(source)?;
    if output_index >= src.output_port_count() {
      return Err(GraphError::InvalidOutputPort {
        path: src.path().to_string(),
        node_type: src.node_type(),
        index: output_index,
      });
    }
    let source_path = src.path().to_string();

    let dst = self.node_ref(dest)?;
    let valid_port = match dst.node_type().arity() {
      Arity::Single => input_index < dst.input_port_count(),
      Arity::Multi => input_index <= dst.inputs.len(),
    };
    if !valid_port {
      return Err(GraphError::InvalidInputPort {
        path: dst.path().to_string(),
        node_type: dst.node_type(),
        index: input_index,
      });
    }
    if source == dest || self.depends_on(source, dest) {
      return Err(GraphError::CycleDetected {
        source_path,
        dest_path: dst.path().to_string(),
      });
    }

    if let Some(existing) = dst.inputs.get(&input_index).copied() {
      let same = self
        .connections
        .get(&existing)
        .is_some_and(|c| c.source() == source && c.output_index() == output_index);
      if same {
        return Ok(existing);
      }
      if let Some(old) = self.detach(existing) {
        let old_source = self
          .node(old.source())
          .map(|n| n.path().to_string())
          .unwrap_or_default();
        self
          .node_entry(dest)?
          .warn(format!("input {input_index}: replaced connection from {old_source}"));
      }
    }

    let conn = Connection::new(source, output_index, dest, input_index);
    let id = conn.session_id();
    self.connections.insert(id, conn);
    self.node_entry(dest)?.inputs.insert(input_index, id);
    self
      .node_entry(source)?
      .outputs
      .entry(output_index)
      .or_default()
      .push(id);
    self.node_entry(dest)?.invalidate();
    debug!(connection = %id, from = %source_path, input_index, "connected");
    Ok(id)
  }

  /// Disconnects input `input_index` of `dest`.
  #[instrument(level = "trace", skip(self))]
  pub fn remove_input(&mut self, dest: NodeId, input_index: usize) -> GraphResult<()> {
    let node = self.node_ref(dest)?;
    let id = node
      .inputs
      .get(&input_index)
      .copied()
      .ok_or_else(|| GraphError::ConnectionNotFound(format!("{}[{input_index}]", node.path())))?;
    self.remove_connection(id)
  }

  /// Removes a connection by session id, detaching both ends.
  #[instrument(level = "trace", skip(self))]
  pub fn remove_connection(&mut self, id: ConnectionId) -> GraphResult<()> {
    let conn = self
      .detach(id)
      .ok_or_else(|| GraphError::ConnectionNotFound(id.to_string()))?;
    self.compact_inputs(conn.dest());
    Ok(())
  }

  /// Unlinks a connection from both endpoints and invalidates the destination.
  pub(crate) fn detach(&mut self, id: ConnectionId) -> Option<Connection> {
    let conn = self.connections.remove(&id)?;
    if let Some(dest) = self.nodes.get_mut(&conn.dest()) {
      if dest.inputs.get(&conn.input_index()) == Some(&id) {
        dest.inputs.remove(&conn.input_index());
      }
      dest.invalidate();
    }
    if let Some(source) = self.nodes.get_mut(&conn.source()) {
      if let Some(list) = source.outputs.get_mut(&conn.output_index()) {
        list.retain(|c| *c != id);
        if list.is_empty() {
          source.outputs.remove(&conn.output_index());
        }
      }
    }
    debug!(connection = %id, "disconnected");
    Some(conn)
  }

  /// Renumbers the inputs of a multi-arity node so connected ports are contiguous from 0.
  ///
  /// Moved connections are recreated and get new session ids.
  pub(crate) fn compact_inputs(&mut self, dest: NodeId) {
    let Some(node) = self.nodes.get(&dest) else {
      return;
    };
    if node.node_type().arity() != Arity::Multi {
      return;
    }
    let moves: Vec<(usize, ConnectionId)> = node
      .inputs
      .values()
      .enumerate()
      .filter(|(new_index, id)| {
        self
          .connections
          .get(id)
          .is_some_and(|c| c.input_index() != *new_index)
      })
      .map(|(new_index, id)| (new_index, *id))
      .collect();
    for (new_index, id) in moves {
      let Some(old) = self.detach(id) else {
        continue;
      };
      let mut conn = Connection::new(old.source(), old.output_index(), dest, new_index);
      conn.selected = old.selected;
      let new_id = conn.session_id();
      self.connections.insert(new_id, conn);
      if let Some(node) = self.nodes.get_mut(&dest) {
        node.inputs.insert(new_index, new_id);
      }
      if let Some(source) = self.nodes.get_mut(&old.source()) {
        source.outputs.entry(old.output_index()).or_default().push(new_id);
      }
    }
  }

  pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
    self.connections.get(&id)
  }

  pub fn connections(&self) -> impl Iterator<Item = &Connection> {
    self.connections.values()
  }

  /// Connection feeding input `input_index` of `node`, if any.
  pub fn input_connection(&self, node: NodeId, input_index: usize) -> Option<&Connection> {
    let id = self.nodes.get(&node)?.inputs.get(&input_index)?;
    self.connections.get(id)
  }

  /// Connections leaving output `output_index` of `node`.
  pub fn output_connections(&self, node: NodeId, output_index: usize) -> Vec<&Connection> {
    self
      .nodes
      .get(&node)
      .and_then(|n| n.outputs.get(&output_index))
      .map(|ids| ids.iter().filter_map(|id| self.connections.get(id)).collect())
      .unwrap_or_default()
  }

  pub fn select_connection(&mut self, id: ConnectionId, selected: bool) -> GraphResult<()> {
    let conn = self
      .connections
      .get_mut(&id)
      .ok_or_else(|| GraphError::ConnectionNotFound(id.to_string()))?;
    conn.selected = selected;
    Ok(())
  }

  /// `(input_index, source, output_index)` for every connected input of `node`, in port order.
  pub(crate) fn input_sources(&self, node: NodeId) -> Vec<(usize, NodeId, usize)> {
    self
      .nodes
      .get(&node)
      .map(|n| {
        n.inputs
          .iter()
          .filter_map(|(index, id)| {
            let c = self.connections.get(id)?;
            Some((*index, c.source(), c.output_index()))
          })
          .collect()
      })
      .unwrap_or_default()
  }

  /// Data dependencies of `node`: connected sources, plus the implicit edges of loopers
  /// (an input relay reads its looper's input, a looper reads its output relay).
  pub(crate) fn dependencies(&self, node: NodeId) -> Vec<NodeId> {
    let mut deps: Vec<NodeId> = self
      .input_sources(node)
      .into_iter()
      .map(|(_, source, _)| source)
      .collect();
    let Some(n) = self.nodes.get(&node) else {
      return deps;
    };
    match n.node_type() {
      NodeType::InputRelay => {
        if let Ok(looper) = self.id_of(n.parent_path()) {
          deps.extend(self.input_sources(looper).into_iter().map(|(_, s, _)| s));
        }
      }
      NodeType::Looper => {
        if let Ok(relay) = self.id_of(&join_path(n.path(), "output")) {
          deps.push(relay);
        }
      }
      _ => {}
    }
    deps
  }

  /// True if `node` transitively depends on `target`.
  pub fn depends_on(&self, node: NodeId, target: NodeId) -> bool {
    let mut visited = HashSet::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
      if !visited.insert(current) {
        continue;
      }
      for dep in self.dependencies(current) {
        if dep == target {
          return true;
        }
        stack.push(dep);
      }
    }
    false
  }
}
