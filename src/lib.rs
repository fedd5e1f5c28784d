//! # textweave
//!
//! A lazily cooked node graph for text-transformation pipelines.
//!
//! ## Architecture
//!
//! A [Workspace] owns the whole graph: nodes addressed by hierarchical paths, the
//! connections between their ports, the [GlobalStore] and the [LoopManager]. Nodes are
//! cooked on demand: `cook` walks upstream, recomputes only what is dirty (state, upstream
//! dirtiness or a content hash over parms and inputs) and caches each node's output.
//!
//! Node kinds live in [nodes]. The [nodes::Looper] composite is the only control-flow
//! construct: it re-cooks the body between its two relay children once per iteration and
//! exposes the iteration value to parm expressions (see [expression]).
//!
//! ```no_run
//! use textweave::{NodeType, Workspace};
//!
//! let mut ws = Workspace::new();
//! let looper = ws.create_node(NodeType::Looper, None, None)?;
//! ws.set_parm(looper, "max", 3)?;
//! let text = ws.create_node(NodeType::Text, Some("item"), Some("/looper1"))?;
//! ws.set_parm(text, "text_string", "Item $$N")?;
//! let relay = ws.id_of("/looper1/output")?;
//! ws.set_input(relay, 0, text, 0)?;
//! assert_eq!(ws.eval(looper)?, vec!["Item 1", "Item 2", "Item 3"]);
//! # Ok::<(), textweave::GraphError>(())
//! ```

pub(crate) mod agent_run;
pub mod config;
pub mod dot_loader;
pub mod error;
pub mod expression;
pub mod globals;
pub mod loops;
pub mod node;
pub mod nodes;
pub mod types;
pub mod workspace;

pub use config::EngineConfig;
pub use dot_loader::{LoadReport, load_dot};
pub use error::{GraphError, GraphResult};
pub use globals::GlobalStore;
pub use loops::LoopManager;
pub use node::{Composite, Node, NodeBehavior};
pub use types::{
  Arity, Connection, ConnectionId, NodeId, NodeState, NodeType, Output, Parm, ParmType, ParmValue,
};
pub use workspace::{RegistryEvent, Workspace, WorkspaceSnapshot};
