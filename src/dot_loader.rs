//! Builds a workspace graph from a DOT subset.
//!
//! ```text
//! digraph pipeline {
//!   graph [COUNT="3"]
//!   loop1 [type=looper, max="$COUNT"]
//!   item [type=text, parent=loop1, text_string="Item $$N"]
//!   item -> "loop1/output"
//!   src [type=file_in, file_path="in.txt"]
//!   src -> merge1 [input=0]
//! }
//! ```
//!
//! Graph attributes with global-style keys (`COUNT`, `FOO_1`) set globals; other graph
//! attributes are skipped with a warning. Node statements create nodes of `type` under
//! `parent`; every other attribute goes through the persisted attribute mapping, so parms
//! are set by name and unknown keys are warn-skipped. Ids may be quoted paths such as
//! `"loop1/output"` to address permanent children. Edge attributes `input` and `output`
//! select ports; without `input` a multi-input node gets its next open port.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::error::{GraphError, GraphResult};
use crate::globals::GlobalStore;
use crate::types::{Arity, NodeId, NodeType};
use crate::workspace::{Workspace, join_path, normalize_path, parent_path, path_name};

/// List of key-value attribute pairs from DOT `[key=value,...]` blocks.
type AttrList = Vec<(String, String)>;

/// Parsed DOT document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DotGraph {
  pub name: Option<String>,
  pub attrs: AttrList,
  pub nodes: Vec<DotNode>,
  pub edges: Vec<DotEdge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DotNode {
  pub id: String,
  pub attrs: AttrList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DotEdge {
  pub from: String,
  pub to: String,
  pub attrs: AttrList,
}

/// What [load_dot] built.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
  /// DOT id to created (or addressed) node.
  pub nodes: BTreeMap<String, NodeId>,
  pub warnings: Vec<String>,
}

/// Parses `source` and builds its nodes, connections and globals into `ws`.
#[instrument(level = "trace", skip(ws, source))]
pub fn load_dot(ws: &mut Workspace, source: &str) -> GraphResult<LoadReport> {
  let graph = parse_dot(source).map_err(GraphError::Parse)?;
  let mut report = LoadReport::default();

  for (key, value) in &graph.attrs {
    if GlobalStore::is_valid_key(key) {
      ws.globals_mut().set(key, value.clone())?;
    } else {
      report.warnings.push(format!("graph attribute {key} ignored"));
    }
  }

  build_nodes(ws, &graph.nodes, &mut report)?;
  build_edges(ws, &graph.edges, &mut report)?;

  for warning in &report.warnings {
    warn!("{warning}");
  }
  info!(
    nodes = report.nodes.len(),
    edges = graph.edges.len(),
    warnings = report.warnings.len(),
    "dot graph loaded"
  );
  Ok(report)
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
  attrs
    .iter()
    .find(|(k, _)| k == key)
    .map(|(_, v)| v.as_str())
}

/// Path a node statement addresses: its id below `parent` (root by default).
fn target_path(node: &DotNode) -> String {
  let parent = normalize_path(attr(&node.attrs, "parent").unwrap_or("/"));
  let id = node.id.trim_matches('/');
  join_path(&parent, id)
}

/// Creates nodes parents first. Statements whose parent does not exist yet are retried
/// after the others.
fn build_nodes(ws: &mut Workspace, nodes: &[DotNode], report: &mut LoadReport) -> GraphResult<()> {
  let mut pending: Vec<&DotNode> = nodes.iter().collect();
  while !pending.is_empty() {
    let before = pending.len();
    let mut deferred = Vec::new();
    for node in pending {
      let path = target_path(node);
      let parent = parent_path(&path);
      if parent != "/" && !ws.node_exists(parent) {
        deferred.push(node);
        continue;
      }
      let id = build_node(ws, node, &path, report)?;
      report.nodes.insert(node.id.clone(), id);
    }
    if deferred.len() == before {
      let missing: Vec<String> = deferred.iter().map(|n| target_path(n)).collect();
      return Err(GraphError::Parse(format!(
        "parent not found for {}",
        missing.join(", ")
      )));
    }
    pending = deferred;
  }
  Ok(())
}

fn build_node(
  ws: &mut Workspace,
  node: &DotNode,
  path: &str,
  report: &mut LoadReport,
) -> GraphResult<NodeId> {
  let id = match attr(&node.attrs, "type") {
    Some(kind) => {
      let node_type: NodeType = kind.parse()?;
      let permanent = ws
        .node_by_path(path)
        .filter(|n| n.is_permanent() && n.node_type() == node_type)
        .map(|n| n.session_id());
      match permanent {
        Some(existing) => existing,
        None => ws.create_node(node_type, Some(path_name(path)), Some(parent_path(path)))?,
      }
    }
    None => ws
      .id_of(path)
      .map_err(|_| GraphError::Parse(format!("node {} has no type", node.id)))?,
  };

  let mut attributes = Map::new();
  for (key, value) in &node.attrs {
    if matches!(key.as_str(), "type" | "parent") {
      continue;
    }
    attributes.insert(key.clone(), attribute_value(key, value));
  }
  if !attributes.is_empty() {
    for warning in ws.apply_attributes(id, &attributes)? {
      report.warnings.push(format!("{}: {warning}", node.id));
    }
  }
  Ok(id)
}

/// JSON form of a DOT attribute for the attribute mapping.
fn attribute_value(key: &str, raw: &str) -> Value {
  match key {
    "pos" => {
      let xy: Vec<f64> = raw
        .split(',')
        .filter_map(|p| p.trim().parse().ok())
        .collect();
      if xy.len() == 2 {
        Value::from(xy)
      } else {
        Value::String(raw.to_string())
      }
    }
    "enabled" | "selected" => match raw.trim().to_ascii_lowercase().as_str() {
      "true" | "1" => Value::Bool(true),
      "false" | "0" => Value::Bool(false),
      _ => Value::String(raw.to_string()),
    },
    _ => Value::String(raw.to_string()),
  }
}

fn resolve(ws: &mut Workspace, report: &LoadReport, id: &str) -> GraphResult<NodeId> {
  if let Some(node) = report.nodes.get(id) {
    return Ok(*node);
  }
  ws.node_from_name(id)
    .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
}

fn port(attrs: &[(String, String)], key: &str) -> GraphResult<Option<usize>> {
  attr(attrs, key)
    .map(|v| {
      v.trim()
        .parse()
        .map_err(|_| GraphError::Parse(format!("{key}={v} is not a port index")))
    })
    .transpose()
}

fn build_edges(ws: &mut Workspace, edges: &[DotEdge], report: &mut LoadReport) -> GraphResult<()> {
  for edge in edges {
    let source = resolve(ws, report, &edge.from)?;
    let dest = resolve(ws, report, &edge.to)?;
    let output_index = port(&edge.attrs, "output")?.unwrap_or(0);
    let input_index = match port(&edge.attrs, "input")? {
      Some(i) => i,
      None => ws
        .node(dest)
        .filter(|n| n.node_type().arity() == Arity::Multi)
        .map(|n| n.inputs().len())
        .unwrap_or(0),
    };
    ws.set_input(dest, input_index, source, output_index)?;
    for (key, _) in &edge.attrs {
      if !matches!(key.as_str(), "input" | "output") {
        report
          .warnings
          .push(format!("{} -> {}: edge attribute {key} ignored", edge.from, edge.to));
      }
    }
  }
  Ok(())
}

/// Parses a DOT source string into a [DotGraph].
pub fn parse_dot(source: &str) -> Result<DotGraph, String> {
  let source = strip_comments(source);
  let source = source.trim();

  let rest = source
    .strip_prefix("digraph")
    .ok_or("Expected 'digraph' at start")?
    .trim_start();
  let mut graph = DotGraph::default();
  let rest = match parse_id(rest) {
    Some((name, rest)) => {
      graph.name = Some(name);
      rest.trim_start()
    }
    None => rest,
  };
  let rest = rest
    .strip_prefix('{')
    .ok_or("Expected '{' after graph name")?;

  let mut remaining = rest.trim();
  while !remaining.is_empty() && !remaining.starts_with('}') {
    remaining = parse_statement(remaining, &mut graph)?;
    remaining = remaining.trim();
  }
  if !remaining.starts_with('}') {
    return Err("Expected '}' at end of graph".to_string());
  }
  Ok(graph)
}

/// Strips `//` and `/* */` comments outside quoted strings.
pub(crate) fn strip_comments(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut chars = s.chars().peekable();
  let mut in_string = false;
  while let Some(c) = chars.next() {
    if in_string {
      out.push(c);
      match c {
        '\\' => {
          if let Some(escaped) = chars.next() {
            out.push(escaped);
          }
        }
        '"' => in_string = false,
        _ => {}
      }
      continue;
    }
    match (c, chars.peek()) {
      ('"', _) => {
        in_string = true;
        out.push(c);
      }
      ('/', Some('/')) => {
        for skipped in chars.by_ref() {
          if skipped == '\n' {
            out.push('\n');
            break;
          }
        }
      }
      ('/', Some('*')) => {
        chars.next();
        let mut prev = '\0';
        for skipped in chars.by_ref() {
          if prev == '*' && skipped == '/' {
            break;
          }
          prev = skipped;
        }
      }
      _ => out.push(c),
    }
  }
  out
}

/// Parses an identifier (alphanumeric + underscore) and returns it plus the remaining string.
pub(crate) fn parse_identifier(s: &str) -> Option<(&str, &str)> {
  let s = s.trim_start();
  let end = s
    .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
    .unwrap_or(s.len());
  if end > 0 {
    Some((&s[..end], &s[end..]))
  } else {
    None
  }
}

/// Parses a node id: an identifier or a quoted string.
pub(crate) fn parse_id(s: &str) -> Option<(String, &str)> {
  let s = s.trim_start();
  if s.starts_with('"') {
    parse_quoted(s).ok()
  } else {
    parse_identifier(s).map(|(id, rest)| (id.to_string(), rest))
  }
}

/// Parses a single graph statement and updates `graph`. Returns the unconsumed remainder.
fn parse_statement<'a>(s: &'a str, graph: &mut DotGraph) -> Result<&'a str, String> {
  let s = s.trim_start();
  if s.starts_with('}') {
    return Ok(s);
  }
  if let Some(rest) = keyword(s, "graph") {
    let (attrs, rest) = parse_attr_block(rest)?;
    graph.attrs.extend(attrs);
    return Ok(end_statement(rest));
  }
  if let Some(rest) = keyword(s, "node").or_else(|| keyword(s, "edge")) {
    let (_, rest) = parse_attr_block(rest)?;
    return Ok(end_statement(rest));
  }
  if keyword(s, "subgraph").is_some() {
    return skip_subgraph(s);
  }

  let (id, rest) = parse_id(s).ok_or_else(|| format!("Expected identifier near {:?}", preview(s)))?;
  let rest = rest.trim_start();

  if let Some(value) = rest.strip_prefix('=') {
    let (v, rest) = parse_value(value)?;
    graph.attrs.push((id, v));
    return Ok(end_statement(rest));
  }
  if rest.starts_with("->") {
    return parse_edge_stmt(id, rest, graph);
  }
  let (attrs, rest) = if rest.starts_with('[') {
    parse_attr_block(rest)?
  } else {
    (Vec::new(), rest)
  };
  graph.nodes.push(DotNode { id, attrs });
  Ok(end_statement(rest))
}

/// Matches `word` followed by a non-identifier character.
fn keyword<'a>(s: &'a str, word: &str) -> Option<&'a str> {
  let rest = s.strip_prefix(word)?;
  match rest.chars().next() {
    Some(c) if c.is_ascii_alphanumeric() || c == '_' => None,
    _ => Some(rest.trim_start()),
  }
}

fn end_statement(s: &str) -> &str {
  s.trim_start().trim_start_matches(';')
}

fn preview(s: &str) -> String {
  s.chars().take(20).collect()
}

/// Parses `[key=value,...]` and returns the attributes plus the remainder.
fn parse_attr_block(s: &str) -> Result<(AttrList, &str), String> {
  let s = s.trim_start().strip_prefix('[').ok_or("Expected '['")?;
  let mut attrs = Vec::new();
  let mut remaining = s.trim_start();
  while !remaining.starts_with(']') {
    if remaining.is_empty() {
      return Err("Unclosed attribute block".to_string());
    }
    let (k, rest) = parse_id(remaining).ok_or("Expected attribute key")?;
    let rest = rest.trim_start().strip_prefix('=').ok_or("Expected '='")?;
    let (v, rest) = parse_value(rest.trim_start())?;
    attrs.push((k, v));
    remaining = rest.trim_start().trim_start_matches([',', ';']).trim_start();
  }
  Ok((attrs, remaining[1..].trim_start()))
}

/// Unescapes `\n`, `\t`, `\"` and `\\`. Other escapes keep their backslash so expression
/// escapes such as `\$` survive.
pub(crate) fn unescape_quoted_string(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut chars = s.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    match chars.next() {
      Some('n') => out.push('\n'),
      Some('t') => out.push('\t'),
      Some('"') => out.push('"'),
      Some('\\') => out.push('\\'),
      Some(other) => {
        out.push('\\');
        out.push(other);
      }
      None => out.push('\\'),
    }
  }
  out
}

fn parse_quoted(s: &str) -> Result<(String, &str), String> {
  let bytes = s.as_bytes();
  let mut end = 1;
  while end < bytes.len() {
    match bytes[end] {
      b'\\' if end + 1 < bytes.len() => end += 2,
      b'"' => break,
      _ => end += 1,
    }
  }
  if end >= bytes.len() {
    return Err("Unterminated string".to_string());
  }
  Ok((unescape_quoted_string(&s[1..end]), &s[end + 1..]))
}

/// Parses a quoted string, number, or identifier value and returns it plus the remainder.
pub(crate) fn parse_value(s: &str) -> Result<(String, &str), String> {
  let s = s.trim_start();
  if s.starts_with('"') {
    let (v, rest) = parse_quoted(s)?;
    Ok((v, rest.trim_start()))
  } else if let Some((num, rest)) = parse_number(s) {
    Ok((num, rest))
  } else {
    let (id, rest) = parse_identifier(s).ok_or("Expected value")?;
    Ok((id.to_string(), rest))
  }
}

/// Parses an optional decimal number and returns it plus the remainder.
pub(crate) fn parse_number(s: &str) -> Option<(String, &str)> {
  let s = s.trim_start();
  let bytes = s.as_bytes();
  let mut end = usize::from(bytes.first() == Some(&b'-'));
  let digits_start = end;
  while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
    end += 1;
  }
  let followed_by_word = bytes
    .get(end)
    .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_');
  if end > digits_start && !followed_by_word {
    Some((s[..end].to_string(), &s[end..]))
  } else {
    None
  }
}

/// Parses an edge statement `id -> target [-> ...] [attrs]` and adds edges to `graph`.
fn parse_edge_stmt<'a>(from: String, mut s: &'a str, graph: &mut DotGraph) -> Result<&'a str, String> {
  let mut chain = vec![from];
  loop {
    s = s["->".len()..].trim_start();
    let (to, rest) = parse_id(s).ok_or("Expected target node")?;
    chain.push(to);
    let rest = rest.trim_start();
    if rest.starts_with("->") {
      s = rest;
      continue;
    }
    let (attrs, rest) = if rest.starts_with('[') {
      parse_attr_block(rest)?
    } else {
      (Vec::new(), rest)
    };
    for pair in chain.windows(2) {
      graph.edges.push(DotEdge {
        from: pair[0].clone(),
        to: pair[1].clone(),
        attrs: attrs.clone(),
      });
    }
    return Ok(end_statement(rest));
  }
}

/// Skips a balanced `{...}` subgraph and returns the remainder.
fn skip_subgraph(s: &str) -> Result<&str, String> {
  let start = s.find('{').ok_or("Expected '{'")?;
  let mut depth = 0;
  for (i, c) in s[start..].char_indices() {
    match c {
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          return Ok(&s[start + i + 1..]);
        }
      }
      _ => {}
    }
  }
  Err("Unclosed subgraph".to_string())
}
