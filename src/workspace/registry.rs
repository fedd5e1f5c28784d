//! Path registry: node creation, lookup, rename/move and cascading removal.

use tracing::{debug, info, instrument, warn};

use super::{ROOT_PATH, Workspace, is_within, join_path, normalize_path, parent_path, path_name};
use crate::error::{GraphError, GraphResult};
use crate::node::Node;
use crate::nodes::create_behavior;
use crate::types::{NodeId, NodeType};

/// Registry mutation notification for an external UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
  /// A node was created. For composites `children` lists the permanent children created with it.
  Created {
    path: String,
    node_type: NodeType,
    children: Vec<String>,
  },
  Removed {
    paths: Vec<String>,
  },
  Renamed {
    old_path: String,
    new_path: String,
  },
}

/// Checks a single path segment.
pub(crate) fn validate_name(name: &str) -> GraphResult<()> {
  let valid = !name.is_empty()
    && name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
  if valid {
    Ok(())
  } else {
    Err(GraphError::InvalidName(name.to_string()))
  }
}

impl Workspace {
  /// Creates a node of `node_type` under `parent` (root when `None`).
  ///
  /// The name defaults to `<kind>1` and is deduplicated against its siblings by replacing the
  /// numeric suffix. Composite kinds create their permanent children in the same call.
  #[instrument(level = "trace", skip(self))]
  pub fn create_node(
    &mut self,
    node_type: NodeType,
    name: Option<&str>,
    parent: Option<&str>,
  ) -> GraphResult<NodeId> {
    let parent = normalize_path(parent.unwrap_or(ROOT_PATH));
    self.check_parent(&parent)?;
    let name = match name {
      Some(n) => {
        validate_name(n)?;
        n.to_string()
      }
      None => node_type.default_name(),
    };
    let path = self.unique_path(&parent, &name);

    let behavior = create_behavior(node_type);
    let permanent_children = behavior
      .as_composite()
      .map(|c| c.permanent_children())
      .unwrap_or(&[]);
    let node = Node::new(path.clone(), node_type, behavior);
    let id = node.session_id();
    self.paths.insert(path.clone(), id);
    self.nodes.insert(id, node);

    self.registering += 1;
    let children = self.create_permanent_children(&path, permanent_children);
    self.registering -= 1;
    let children = match children {
      Ok(children) => children,
      Err(e) => {
        self.discard_subtree(&path);
        return Err(e);
      }
    };

    info!(path = %path, node_type = %node_type, "node created");
    if self.registering == 0 {
      self.events.push(RegistryEvent::Created {
        path,
        node_type,
        children,
      });
    }
    Ok(id)
  }

  /// [Workspace::create_node] with the kind given by name (`"text"`, `"file_in"`, ...).
  pub fn create_node_from_str(
    &mut self,
    kind: &str,
    name: Option<&str>,
    parent: Option<&str>,
  ) -> GraphResult<NodeId> {
    let node_type: NodeType = kind.parse()?;
    self.create_node(node_type, name, parent)
  }

  fn create_permanent_children(
    &mut self,
    parent: &str,
    children: &[(&str, NodeType)],
  ) -> GraphResult<Vec<String>> {
    let mut paths = Vec::with_capacity(children.len());
    for &(name, node_type) in children {
      let id = self.create_node(node_type, Some(name), Some(parent))?;
      let child = self.node_entry(id)?;
      child.permanent = true;
      paths.push(child.path.clone());
    }
    Ok(paths)
  }

  fn check_parent(&self, parent: &str) -> GraphResult<()> {
    if parent == ROOT_PATH {
      return Ok(());
    }
    let node = self
      .node_by_path(parent)
      .ok_or_else(|| GraphError::NodeNotFound(parent.to_string()))?;
    if node.is_composite() {
      Ok(())
    } else {
      Err(GraphError::NotAComposite(parent.to_string()))
    }
  }

  /// First free path for `name` under `parent`: `name` itself, else its stem with
  /// the lowest free numeric suffix.
  pub(crate) fn unique_path(&self, parent: &str, name: &str) -> String {
    let candidate = join_path(parent, name);
    if !self.paths.contains_key(&candidate) {
      return candidate;
    }
    let stem = match name.trim_end_matches(|c: char| c.is_ascii_digit()) {
      "" => name,
      stem => stem,
    };
    (1u64..)
      .map(|n| join_path(parent, &format!("{stem}{n}")))
      .find(|p| !self.paths.contains_key(p))
      .unwrap_or(candidate)
  }

  /// Resolves a full path or a bare node name.
  ///
  /// Exact paths win. A bare name matching several nodes returns the first in path order and
  /// records an ambiguity warning on it.
  pub fn node_from_name(&mut self, query: &str) -> Option<NodeId> {
    if let Some(id) = self.paths.get(query) {
      return Some(*id);
    }
    if let Some(id) = self.paths.get(&normalize_path(query)) {
      return Some(*id);
    }
    let matches: Vec<(String, NodeId)> = self
      .paths
      .iter()
      .filter(|(path, _)| path_name(path) == query)
      .map(|(path, id)| (path.clone(), *id))
      .collect();
    let (first_path, first) = matches.first().cloned()?;
    if matches.len() > 1 {
      let others: Vec<&str> = matches[1..].iter().map(|(p, _)| p.as_str()).collect();
      warn!(name = query, chosen = %first_path, "ambiguous node name");
      if let Some(node) = self.nodes.get_mut(&first) {
        node.warn(format!(
          "ambiguous name {query:?}: also matches {}",
          others.join(", ")
        ));
      }
    }
    Some(first)
  }

  /// All node paths in sorted order.
  pub fn list_nodes(&self) -> Vec<String> {
    self.paths.keys().cloned().collect()
  }

  pub fn node_exists(&self, path: &str) -> bool {
    self.paths.contains_key(&normalize_path(path))
  }

  /// Direct children of `path`.
  pub fn children(&self, path: &str) -> Vec<NodeId> {
    let path = normalize_path(path);
    self
      .paths
      .iter()
      .filter(|(p, _)| p.as_str() != path && parent_path(p) == path)
      .map(|(_, id)| *id)
      .collect()
  }

  /// All nodes strictly below `path`, in path order.
  pub fn descendants(&self, path: &str) -> Vec<NodeId> {
    let path = normalize_path(path);
    self
      .paths
      .iter()
      .filter(|(p, _)| p.as_str() != path && is_within(p, &path))
      .map(|(_, id)| *id)
      .collect()
  }

  fn subtree_paths(&self, path: &str) -> Vec<String> {
    self
      .paths
      .keys()
      .filter(|p| is_within(p, path))
      .cloned()
      .collect()
  }

  /// Removes the node at `path` with all its descendants and detaches every connection
  /// touching them. Returns the removed paths.
  #[instrument(level = "trace", skip(self))]
  pub fn remove_node(&mut self, path: &str) -> GraphResult<Vec<String>> {
    let path = normalize_path(path);
    let id = self.id_of(&path)?;
    if self.node_ref(id)?.permanent {
      return Err(GraphError::PermanentChild(path));
    }
    let removed = self.discard_subtree(&path);
    info!(path = %path, removed = removed.len(), "node removed");
    if self.registering == 0 {
      self.events.push(RegistryEvent::Removed {
        paths: removed.clone(),
      });
    }
    Ok(removed)
  }

  fn discard_subtree(&mut self, path: &str) -> Vec<String> {
    let removed = self.subtree_paths(path);
    let ids: Vec<NodeId> = removed.iter().filter_map(|p| self.paths.get(p).copied()).collect();
    let touching: Vec<_> = self
      .connections
      .values()
      .filter(|c| ids.iter().any(|id| c.touches(*id)))
      .map(|c| c.session_id())
      .collect();
    for conn in touching {
      if let Some(conn) = self.detach(conn) {
        if !ids.contains(&conn.dest()) {
          self.compact_inputs(conn.dest());
        }
      }
    }
    for (p, id) in removed.iter().zip(ids) {
      self.paths.remove(p);
      self.nodes.remove(&id);
      self.loops.clean_stale(p);
    }
    removed
  }

  /// Moves or renames the node at `old_path` to `new_path`, rewriting every descendant path.
  ///
  /// The final name is deduplicated against the new siblings. Returns the path the node
  /// ended up at.
  #[instrument(level = "trace", skip(self))]
  pub fn update_node_path(&mut self, old_path: &str, new_path: &str) -> GraphResult<String> {
    let old_path = normalize_path(old_path);
    let new_path = normalize_path(new_path);
    let id = self.id_of(&old_path)?;
    if self.node_ref(id)?.permanent {
      return Err(GraphError::PermanentChild(old_path));
    }
    if new_path == old_path {
      return Ok(old_path);
    }
    let new_parent = parent_path(&new_path).to_string();
    if is_within(&new_parent, &old_path) {
      return Err(GraphError::InvalidMove {
        path: old_path,
        new_parent,
      });
    }
    validate_name(path_name(&new_path))?;
    self.check_parent(&new_parent)?;
    let target = self.unique_path(&new_parent, path_name(&new_path));

    for path in self.subtree_paths(&old_path) {
      let Some(node_id) = self.paths.remove(&path) else {
        continue;
      };
      let rewritten = format!("{target}{}", &path[old_path.len()..]);
      debug!(from = %path, to = %rewritten, "path rewrite");
      if let Some(node) = self.nodes.get_mut(&node_id) {
        node.path = rewritten.clone();
        node.invalidate();
      }
      self.paths.insert(rewritten, node_id);
    }

    info!(from = %old_path, to = %target, "node moved");
    if self.registering == 0 {
      self.events.push(RegistryEvent::Renamed {
        old_path,
        new_path: target.clone(),
      });
    }
    Ok(target)
  }

  /// Renames a node in place.
  pub fn rename_node(&mut self, path: &str, new_name: &str) -> GraphResult<String> {
    let path = normalize_path(path);
    let target = join_path(parent_path(&path), new_name);
    self.update_node_path(&path, &target)
  }

  /// Moves a node (and its subtree) under `new_parent`, keeping its name.
  pub fn set_parent(&mut self, path: &str, new_parent: &str) -> GraphResult<String> {
    let path = normalize_path(path);
    let target = join_path(&normalize_path(new_parent), path_name(&path));
    self.update_node_path(&path, &target)
  }

  /// Removes every node and connection and ends all loops. Globals are kept.
  #[instrument(level = "trace", skip(self))]
  pub fn flush_all(&mut self) {
    let removed = self.list_nodes();
    self.nodes.clear();
    self.paths.clear();
    self.connections.clear();
    self.loops.clear();
    info!(removed = removed.len(), "registry flushed");
    if !removed.is_empty() && self.registering == 0 {
      self.events.push(RegistryEvent::Removed { paths: removed });
    }
  }
}
