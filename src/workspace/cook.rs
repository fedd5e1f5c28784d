//! Cook/eval state machine, dirty checking and parm access.
//!
//! `cook` is a recursive, synchronous call chain: upstream inputs are cooked first, the
//! node's behavior runs, and the result lands in the node's cache. The `Cooking` state is
//! the re-entrancy guard that turns a runtime cycle into an error on the node.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, trace, warn};

use super::{HashContext, ROOT_PATH, Workspace, is_within, join_path, parent_path};
use crate::error::{GraphError, GraphResult};
use crate::expression::{EvalContext, Evaluated, LoopScope};
use crate::node::Node;
use crate::types::{NodeId, NodeState, NodeType, Output, ParmType, ParmValue};

/// Result of hashing a node's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContentHash {
  Digest(String),
  /// Upstream content exceeded the configured limit (bytes seen so far).
  TooLarge(usize),
}

impl Workspace {
  /// Cooks `id` if it is dirty or `force` is set.
  ///
  /// Cook failures never surface as `Err`: they are recorded on the node, which reverts to
  /// `Uncooked` so the next call retries. `Err` means `id` does not exist.
  #[instrument(level = "trace", skip(self))]
  pub fn cook(&mut self, id: NodeId, force: bool) -> GraphResult<()> {
    let node = self.node_ref(id)?;
    if node.state == NodeState::Cooking {
      let path = node.path().to_string();
      warn!(path = %path, "cycle detected while cooking");
      self
        .node_entry(id)?
        .error(format!("cycle detected: {path} is already cooking"));
      return Ok(());
    }
    if !force && !self.needs_to_cook(id)? {
      trace!(node = %id, "cache hit");
      return Ok(());
    }

    let node = self.node_entry(id)?;
    node.errors.clear();
    node.warnings.clear();
    node.state = NodeState::Cooking;
    let entered = Instant::now();

    let mut failed_input = None;
    for (index, source, _) in self.input_sources(id) {
      self.cook(source, false)?;
      let upstream = self.node_ref(source)?;
      if failed_input.is_none() && (!upstream.state.is_valid() || !upstream.errors.is_empty()) {
        failed_input = Some(format!("input {index} ({}) failed to cook", upstream.path()));
      }
    }

    let node = self.node_entry(id)?;
    if let Some(message) = failed_input {
      debug!(path = %node.path, "{message}");
      node.cook_count += 1;
      node.last_cook_time = entered.elapsed().as_secs_f64() * 1000.0;
      node.last_cooked_at = Some(Utc::now());
      node.error(message);
      node.state = NodeState::Uncooked;
      node.last_hash = None;
      return Ok(());
    }
    node.cook_count += 1;
    let enabled = node.enabled;
    let mut behavior = node.behavior.take();

    let started = Instant::now();
    let result = match behavior.as_mut() {
      Some(b) if enabled => {
        let mut ctx = super::CookContext::new(self, id);
        b.cook(&mut ctx)
      }
      Some(_) => Ok(self.upstream_output(id, 0)),
      None => Err("node behavior is missing".to_string()),
    };
    let elapsed = started.elapsed().as_secs_f64() * 1000.0;

    let node = self.node_entry(id)?;
    node.behavior = behavior;
    node.last_cook_time = elapsed;
    node.last_cooked_at = Some(Utc::now());
    match result {
      Ok(output) => {
        let unchanged = node.cook_count > 1 && node.output == output;
        node.output = output;
        node.state = if unchanged {
          NodeState::Unchanged
        } else {
          NodeState::Cooked
        };
        let limit = self.config.hash_size_limit;
        let hash = self.content_hash(id)?;
        let node = self.node_entry(id)?;
        node.last_hash = match hash {
          ContentHash::Digest(h) => Some(h),
          ContentHash::TooLarge(size) => {
            node.warn(format!(
              "dirty check skipped: {size} bytes of input exceed the {limit} byte limit"
            ));
            None
          }
        };
        debug!(
          path = %node.path,
          cook_count = node.cook_count,
          state = %node.state,
          elapsed_ms = elapsed,
          "cooked"
        );
      }
      Err(message) => {
        warn!(path = %node.path, error = %message, "cook failed");
        node.error(message);
        node.state = NodeState::Uncooked;
        node.last_hash = None;
      }
    }
    Ok(())
  }

  /// Cooks `id` if needed and returns its cached output.
  pub fn eval(&mut self, id: NodeId) -> GraphResult<Output> {
    self.cook(id, false)?;
    self.get_output(id)
  }

  /// [Workspace::eval] on behalf of a downstream node, for tracing.
  pub fn eval_from(&mut self, id: NodeId, requesting: Option<NodeId>) -> GraphResult<Output> {
    if let Some(requesting) = requesting {
      trace!(node = %id, requested_by = %requesting, "eval");
    }
    self.eval(id)
  }

  /// Cached output of `id` without cooking.
  pub fn get_output(&self, id: NodeId) -> GraphResult<Output> {
    Ok(self.node_ref(id)?.output.clone())
  }

  /// Cached output of whatever feeds input `index` of `id`.
  pub(crate) fn upstream_output(&self, id: NodeId, index: usize) -> Output {
    self
      .input_connection(id, index)
      .and_then(|c| self.node(c.source()))
      .map(|n| n.output.clone())
      .unwrap_or_default()
  }

  /// True if the next `cook(id, false)` would recompute.
  pub fn needs_to_cook(&self, id: NodeId) -> GraphResult<bool> {
    let mut visited = HashSet::new();
    self.is_dirty(id, &mut visited)
  }

  fn is_dirty(&self, id: NodeId, visited: &mut HashSet<NodeId>) -> GraphResult<bool> {
    if !visited.insert(id) {
      return Ok(false);
    }
    let node = self.node_ref(id)?;
    match node.state {
      NodeState::Uncooked => return Ok(true),
      NodeState::Cooking => return Ok(false),
      NodeState::Cooked | NodeState::Unchanged => {}
    }
    for (_, source, _) in self.input_sources(id) {
      if self.is_dirty(source, visited)? {
        return Ok(true);
      }
    }
    if node.composite {
      for body_id in self.body_nodes(id) {
        let body = self.node_ref(body_id)?;
        // never-cooked body nodes are not part of the cached result
        if body.state == NodeState::Uncooked && body.cook_count > 0 {
          return Ok(true);
        }
        for source in self.dependencies(body_id) {
          let external = self
            .nodes
            .get(&source)
            .is_some_and(|n| !is_within(n.path(), node.path()));
          if external && self.is_dirty(source, visited)? {
            return Ok(true);
          }
        }
      }
    }
    Ok(match self.content_hash(id)? {
      ContentHash::Digest(h) => node.last_hash.as_deref() != Some(h.as_str()),
      ContentHash::TooLarge(_) => true,
    })
  }

  /// Digest over the node kind, enabled flag, parms (raw and evaluated), upstream content and
  /// any kind-specific extension.
  pub(crate) fn content_hash(&self, id: NodeId) -> GraphResult<ContentHash> {
    let node = self.node_ref(id)?;
    let scope = self.loop_scope(id);
    let ctx = EvalContext::new(&self.globals, scope);
    let mut hasher = Sha256::new();
    hasher.update(node.node_type().as_str().as_bytes());
    hasher.update([u8::from(node.enabled)]);
    for parm in &node.parms {
      hasher.update(parm.name().as_bytes());
      hasher.update(parm.raw().to_json().to_string().as_bytes());
      hasher.update(parm.eval(&ctx).value.to_json().to_string().as_bytes());
    }

    let limit = self.config.hash_size_limit;
    let mut size = 0usize;
    for (index, source, output_index) in self.input_sources(id) {
      let upstream = self.node_ref(source)?;
      size += upstream.output.iter().map(String::len).sum::<usize>();
      if size > limit {
        return Ok(ContentHash::TooLarge(size));
      }
      hasher.update(index.to_le_bytes());
      hasher.update(source.get().to_le_bytes());
      hasher.update(output_index.to_le_bytes());
      for item in &upstream.output {
        hasher.update(item.len().to_le_bytes());
        hasher.update(item.as_bytes());
      }
    }

    if let Some(behavior) = node.behavior.as_deref() {
      let hash_ctx = HashContext {
        ws: self,
        node,
        scope,
      };
      behavior.extend_hash(&hash_ctx, &mut hasher);
    }
    Ok(ContentHash::Digest(format!("{:x}", hasher.finalize())))
  }

  /// Feeds the loop-independent state of a composite's body into `hasher`: outputs of nodes
  /// outside the composite that the body reads, and each body node's hash extension
  /// evaluated outside the loop.
  pub(crate) fn hash_body(&self, composite: NodeId, hasher: &mut Sha256) {
    let Some(path) = self.nodes.get(&composite).map(|n| n.path().to_string()) else {
      return;
    };
    for body_id in self.body_nodes(composite) {
      let Some(body) = self.nodes.get(&body_id) else {
        continue;
      };
      hasher.update(body_id.get().to_le_bytes());
      for source in self.dependencies(body_id) {
        let Some(upstream) = self.nodes.get(&source) else {
          continue;
        };
        if is_within(upstream.path(), &path) {
          continue;
        }
        hasher.update(source.get().to_le_bytes());
        for item in &upstream.output {
          hasher.update(item.len().to_le_bytes());
          hasher.update(item.as_bytes());
        }
      }
      if let Some(behavior) = body.behavior.as_deref() {
        let hash_ctx = HashContext {
          ws: self,
          node: body,
          scope: self.loop_scope(body_id),
        };
        behavior.extend_hash(&hash_ctx, hasher);
      }
    }
  }

  /// Loop values visible from `id`, taken from its looper ancestors.
  pub fn loop_scope(&self, id: NodeId) -> LoopScope {
    let Some(node) = self.nodes.get(&id) else {
      return LoopScope::default();
    };
    let mut enclosing = Vec::new();
    let mut current = parent_path(node.path());
    while current != ROOT_PATH {
      if self
        .node_by_path(current)
        .is_some_and(|n| n.node_type() == NodeType::Looper)
      {
        enclosing.push(self.loops.get_loop(current));
      }
      current = parent_path(current);
    }
    LoopScope {
      nearest: enclosing.first().copied().flatten(),
      outer: enclosing.get(1).copied().flatten(),
      innermost: self.loops.innermost(),
    }
  }

  /// Evaluation context for parms of `id`.
  pub fn eval_context(&self, id: NodeId) -> EvalContext<'_> {
    EvalContext::new(&self.globals, self.loop_scope(id))
  }

  /// Sets a parm, checking the value against its declared type, and invalidates the node.
  #[instrument(level = "trace", skip(self, value))]
  pub fn set_parm(&mut self, id: NodeId, name: &str, value: impl Into<ParmValue>) -> GraphResult<()> {
    let value = value.into();
    let node = self.node_entry(id)?;
    let path = node.path.clone();
    let parm = node.parm_mut(name).ok_or_else(|| GraphError::ParmNotFound {
      path: path.clone(),
      parm: name.to_string(),
    })?;
    parm.set(value).map_err(|message| GraphError::ParmType {
      path: path.clone(),
      parm: name.to_string(),
      message,
    })?;
    node.invalidate();
    debug!(path = %path, parm = name, "parm set");
    Ok(())
  }

  /// Sets a parm from JSON, converting by the parm's declared type.
  pub fn set_parm_json(&mut self, id: NodeId, name: &str, value: &serde_json::Value) -> GraphResult<()> {
    let parm_type = self.parm_type(id, name)?;
    let value = ParmValue::from_json(parm_type, value).map_err(|message| GraphError::ParmType {
      path: self.nodes.get(&id).map(|n| n.path.clone()).unwrap_or_default(),
      parm: name.to_string(),
      message,
    })?;
    self.set_parm(id, name, value)
  }

  pub fn reset_parm(&mut self, id: NodeId, name: &str) -> GraphResult<()> {
    let node = self.node_entry(id)?;
    let path = node.path.clone();
    node
      .parm_mut(name)
      .ok_or_else(|| GraphError::ParmNotFound {
        path,
        parm: name.to_string(),
      })?
      .reset_to_default();
    node.invalidate();
    Ok(())
  }

  fn parm_type(&self, id: NodeId, name: &str) -> GraphResult<ParmType> {
    let node = self.node_ref(id)?;
    node
      .parm(name)
      .map(|p| p.parm_type())
      .ok_or_else(|| GraphError::ParmNotFound {
        path: node.path.clone(),
        parm: name.to_string(),
      })
  }

  /// Evaluates a parm in the node's current loop context. Never cached.
  pub fn eval_parm(&self, id: NodeId, name: &str) -> GraphResult<Evaluated<ParmValue>> {
    let node = self.node_ref(id)?;
    let parm = node.parm(name).ok_or_else(|| GraphError::ParmNotFound {
      path: node.path.clone(),
      parm: name.to_string(),
    })?;
    Ok(parm.eval(&self.eval_context(id)))
  }

  /// Runs the callback of a BUTTON parm.
  #[instrument(level = "trace", skip(self))]
  pub fn press_button(&mut self, id: NodeId, name: &str) -> GraphResult<()> {
    let node = self.node_ref(id)?;
    let parm = node.parm(name).ok_or_else(|| GraphError::ParmNotFound {
      path: node.path.clone(),
      parm: name.to_string(),
    })?;
    let callback = parm.callback().ok_or_else(|| GraphError::ParmType {
      path: node.path.clone(),
      parm: name.to_string(),
      message: format!("{} parm is not a button", parm.parm_type()),
    })?;
    callback(self, id)
  }

  /// Marks `id` dirty; downstream nodes see it through their upstream check.
  pub fn invalidate(&mut self, id: NodeId) -> GraphResult<()> {
    self.node_entry(id)?.invalidate();
    Ok(())
  }

  pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> GraphResult<()> {
    let node = self.node_entry(id)?;
    node.enabled = enabled;
    node.invalidate();
    Ok(())
  }

  /// Force-cooks `root` and everything upstream of it that lies inside `within`,
  /// dependencies first.
  pub(crate) fn force_cook_upstream(&mut self, root: NodeId, within: &str) -> GraphResult<()> {
    for id in self.upstream_within(root, within) {
      self.cook(id, true)?;
    }
    Ok(())
  }

  /// Postorder walk of connected sources from `root`, restricted to paths inside `within`.
  fn upstream_within(&self, root: NodeId, within: &str) -> Vec<NodeId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    self.collect_upstream(root, within, &mut visited, &mut order);
    order
  }

  fn collect_upstream(
    &self,
    id: NodeId,
    within: &str,
    visited: &mut HashSet<NodeId>,
    order: &mut Vec<NodeId>,
  ) {
    let inside = self
      .nodes
      .get(&id)
      .is_some_and(|n| is_within(n.path(), within));
    if !inside || !visited.insert(id) {
      return;
    }
    for (_, source, _) in self.input_sources(id) {
      self.collect_upstream(source, within, visited, order);
    }
    order.push(id);
  }

  /// Nodes a composite's output depends on inside its own subtree.
  pub(crate) fn body_nodes(&self, composite: NodeId) -> Vec<NodeId> {
    let Some(node) = self.nodes.get(&composite) else {
      return Vec::new();
    };
    let path = node.path();
    match self.id_of(&join_path(path, "output")) {
      Ok(output) => self.upstream_within(output, path),
      Err(_) => Vec::new(),
    }
  }

  /// Cooks every node that has no outgoing connection; returns the ids cooked.
  pub fn cook_all(&mut self, force: bool) -> GraphResult<Vec<NodeId>> {
    let sinks: Vec<NodeId> = self
      .nodes()
      .filter(|n| n.outputs.is_empty() && n.parent_path() == ROOT_PATH)
      .map(Node::session_id)
      .collect();
    for id in &sinks {
      self.cook(*id, force)?;
    }
    Ok(sinks)
  }
}
