//! An edge from one node's output port to another node's input port.

use super::{ConnectionId, NodeId};

/// An edge from one node's output port to another node's input port.
///
/// Endpoints are fixed at construction; only the selection flag changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
  id: ConnectionId,
  source: NodeId,
  output_index: usize,
  dest: NodeId,
  input_index: usize,
  pub selected: bool,
}

impl Connection {
  pub(crate) fn new(source: NodeId, output_index: usize, dest: NodeId, input_index: usize) -> Self {
    Self {
      id: ConnectionId::next(),
      source,
      output_index,
      dest,
      input_index,
      selected: false,
    }
  }

  pub fn session_id(&self) -> ConnectionId {
    self.id
  }

  pub fn source(&self) -> NodeId {
    self.source
  }

  pub fn output_index(&self) -> usize {
    self.output_index
  }

  pub fn dest(&self) -> NodeId {
    self.dest
  }

  pub fn input_index(&self) -> usize {
    self.input_index
  }

  /// True if the connection touches `node` on either end.
  pub fn touches(&self, node: NodeId) -> bool {
    self.source == node || self.dest == node
  }
}
