//! Closed set of node kinds and their declared input arity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// How a node kind exposes its input ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
  /// A fixed set of ports; connecting to an occupied port replaces the connection.
  Single,
  /// Connected ports are contiguous from 0 and exactly one more open port is exposed.
  Multi,
}

/// Kind tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
  Text,
  Null,
  Merge,
  Split,
  FileIn,
  FileOut,
  Search,
  Json,
  Query,
  Looper,
  InputRelay,
  OutputRelay,
}

impl NodeType {
  pub const ALL: [NodeType; 12] = [
    NodeType::Text,
    NodeType::Null,
    NodeType::Merge,
    NodeType::Split,
    NodeType::FileIn,
    NodeType::FileOut,
    NodeType::Search,
    NodeType::Json,
    NodeType::Query,
    NodeType::Looper,
    NodeType::InputRelay,
    NodeType::OutputRelay,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      NodeType::Text => "text",
      NodeType::Null => "null",
      NodeType::Merge => "merge",
      NodeType::Split => "split",
      NodeType::FileIn => "file_in",
      NodeType::FileOut => "file_out",
      NodeType::Search => "search",
      NodeType::Json => "json",
      NodeType::Query => "query",
      NodeType::Looper => "looper",
      NodeType::InputRelay => "input_relay",
      NodeType::OutputRelay => "output_relay",
    }
  }

  pub fn arity(self) -> Arity {
    match self {
      NodeType::Merge => Arity::Multi,
      _ => Arity::Single,
    }
  }

  /// Base name used when a node is created without an explicit name.
  pub fn default_name(self) -> String {
    format!("{}1", self.as_str())
  }
}

impl fmt::Display for NodeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for NodeType {
  type Err = GraphError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
    NodeType::ALL
      .into_iter()
      .find(|t| t.as_str() == wanted)
      .ok_or_else(|| GraphError::UnknownNodeType(s.to_string()))
  }
}
