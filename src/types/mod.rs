//! Core graph value types: ids, node kinds, states, connections and parms.

mod connection;
mod ids;
mod node_state;
mod node_type;
mod parm;
#[cfg(test)]
mod parm_test;
mod ui_state;

pub use connection::Connection;
pub use ids::{ConnectionId, NodeId};
pub use node_state::NodeState;
pub use node_type::{Arity, NodeType};
pub use parm::{ButtonCallback, Parm, ParmType, ParmValue};
pub use ui_state::UiState;

/// Data flowing along every connection: an ordered list of text items.
pub type Output = Vec<String>;

/// Data type label reported for every port.
pub const TEXT_LIST: &str = "list[str]";
