//! Cook state of a node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cook state of a node.
///
/// `Uncooked` is both the initial state and the state a node returns to after an
/// invalidation or a failed cook. `Cooking` only exists while the node's compute runs
/// and doubles as the re-entrancy guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
  #[default]
  Uncooked,
  Cooking,
  /// Cooked, and the output equals the previous cache.
  Unchanged,
  Cooked,
}

impl NodeState {
  /// True when the cached output can be served without cooking.
  pub fn is_valid(self) -> bool {
    matches!(self, NodeState::Unchanged | NodeState::Cooked)
  }
}

impl fmt::Display for NodeState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NodeState::Uncooked => write!(f, "uncooked"),
      NodeState::Cooking => write!(f, "cooking"),
      NodeState::Unchanged => write!(f, "unchanged"),
      NodeState::Cooked => write!(f, "cooked"),
    }
  }
}
