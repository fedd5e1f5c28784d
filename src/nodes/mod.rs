//! Node kinds and the static registry mapping [NodeType] to behaviors.

mod file_in;
mod file_out;
#[cfg(test)]
mod file_out_test;
mod json;
#[cfg(test)]
mod json_test;
mod looper;
mod merge;
#[cfg(test)]
mod merge_test;
mod null;
mod query;
mod relay;
mod search;
mod split;
mod text;
#[cfg(test)]
mod text_test;

pub use file_in::FileIn;
pub use file_out::FileOut;
pub use json::Json;
pub use looper::{INPUT_RELAY, Looper, OUTPUT_RELAY};
pub use merge::Merge;
pub use null::Null;
pub use query::Query;
pub use relay::{InputRelay, OutputRelay};
pub use search::Search;
pub use split::Split;
pub use text::Text;

use crate::node::NodeBehavior;
use crate::types::NodeType;

/// Fresh behavior for a node of `node_type`.
pub fn create_behavior(node_type: NodeType) -> Box<dyn NodeBehavior> {
  match node_type {
    NodeType::Text => Box::new(Text),
    NodeType::Null => Box::new(Null),
    NodeType::Merge => Box::new(Merge),
    NodeType::Split => Box::new(Split),
    NodeType::FileIn => Box::new(FileIn::default()),
    NodeType::FileOut => Box::new(FileOut::default()),
    NodeType::Search => Box::new(Search),
    NodeType::Json => Box::new(Json),
    NodeType::Query => Box::new(Query::default()),
    NodeType::Looper => Box::new(Looper::default()),
    NodeType::InputRelay => Box::new(InputRelay::default()),
    NodeType::OutputRelay => Box::new(OutputRelay::default()),
  }
}
