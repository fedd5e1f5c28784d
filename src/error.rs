//! Errors returned by graph mutation and lookup.
//!
//! These are contract violations (unknown kinds, bad ports, cycles) and are returned
//! immediately. Cook failures never surface here: they are recorded on the node.

use thiserror::Error;

use crate::types::NodeType;

/// Errors raised by [crate::Workspace] operations.
#[derive(Debug, Error)]
pub enum GraphError {
  #[error("unknown node type: {0}")]
  UnknownNodeType(String),

  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("invalid input port {index} on {path} ({node_type})")]
  InvalidInputPort {
    path: String,
    node_type: NodeType,
    index: usize,
  },

  #[error("invalid output port {index} on {path} ({node_type})")]
  InvalidOutputPort {
    path: String,
    node_type: NodeType,
    index: usize,
  },

  #[error("connecting {source_path} -> {dest_path} would create a cycle")]
  CycleDetected {
    source_path: String,
    dest_path: String,
  },

  #[error("invalid global key {0:?}: keys are at least two characters, all uppercase")]
  InvalidGlobalKey(String),

  #[error("parm {parm} not found on {path}")]
  ParmNotFound { path: String, parm: String },

  #[error("parm {parm} on {path}: {message}")]
  ParmType {
    path: String,
    parm: String,
    message: String,
  },

  #[error("{0} is not a composite node")]
  NotAComposite(String),

  #[error("{0} is a permanent child of its parent")]
  PermanentChild(String),

  #[error("invalid node name {0:?}")]
  InvalidName(String),

  #[error("cannot move {path} under {new_parent}")]
  InvalidMove { path: String, new_parent: String },

  #[error("connection not found: {0}")]
  ConnectionNotFound(String),

  #[error("parse error: {0}")]
  Parse(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

/// Result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
