//! Tests for the cook/eval state machine.

use crate::config::EngineConfig;
use crate::types::{Connection, NodeState, NodeType, ParmValue};
use crate::workspace::Workspace;

fn text(ws: &mut Workspace, value: &str) -> crate::types::NodeId {
  let id = ws.create_node(NodeType::Text, None, None).unwrap();
  ws.set_parm(id, "text_string", value).unwrap();
  id
}

#[test]
fn cook_is_memoized() {
  let mut ws = Workspace::new();
  let t = text(&mut ws, "hello");
  ws.cook(t, false).unwrap();
  let count = ws.node(t).unwrap().cook_count();
  assert_eq!(count, 1);
  ws.cook(t, false).unwrap();
  assert_eq!(ws.node(t).unwrap().cook_count(), count);
  assert!(!ws.needs_to_cook(t).unwrap());
  assert_eq!(ws.get_output(t).unwrap(), vec!["hello"]);
  assert_eq!(ws.node(t).unwrap().state(), NodeState::Cooked);
  assert!(ws.node(t).unwrap().last_cooked_at().is_some());
}

#[test]
fn parm_change_invalidates() {
  let mut ws = Workspace::new();
  let t = text(&mut ws, "a");
  ws.eval(t).unwrap();
  ws.set_parm(t, "text_string", "b").unwrap();
  assert!(ws.needs_to_cook(t).unwrap());
  assert_eq!(ws.eval(t).unwrap(), vec!["b"]);
  assert_eq!(ws.node(t).unwrap().cook_count(), 2);
}

#[test]
fn upstream_change_dirties_downstream() {
  let mut ws = Workspace::new();
  let t = text(&mut ws, "a");
  let null = ws.create_node(NodeType::Null, None, None).unwrap();
  ws.set_input(null, 0, t, 0).unwrap();
  assert_eq!(ws.eval(null).unwrap(), vec!["a"]);
  assert!(!ws.needs_to_cook(null).unwrap());

  ws.set_parm(t, "text_string", "b").unwrap();
  assert!(ws.needs_to_cook(null).unwrap());
  assert_eq!(ws.eval(null).unwrap(), vec!["b"]);
  assert_eq!(ws.node(null).unwrap().cook_count(), 2);
}

#[test]
fn global_change_dirties_through_hash() {
  let mut ws = Workspace::new();
  ws.globals_mut().set("FOO", "7").unwrap();
  let t = text(&mut ws, "$FOO");
  assert_eq!(ws.eval(t).unwrap(), vec!["7"]);
  assert!(!ws.needs_to_cook(t).unwrap());
  ws.globals_mut().set("FOO", "8").unwrap();
  assert!(ws.needs_to_cook(t).unwrap());
  assert_eq!(ws.eval(t).unwrap(), vec!["8"]);
}

#[test]
fn forced_cook_with_same_output_is_unchanged() {
  let mut ws = Workspace::new();
  let t = text(&mut ws, "same");
  ws.cook(t, false).unwrap();
  ws.cook(t, true).unwrap();
  let node = ws.node(t).unwrap();
  assert_eq!(node.cook_count(), 2);
  assert_eq!(node.state(), NodeState::Unchanged);
  assert!(node.last_cook_time() >= 0.0);
}

#[test]
fn failure_is_recorded_and_retried() {
  let mut ws = Workspace::new();
  let t = text(&mut ws, "a,b");
  let split = ws.create_node(NodeType::Split, None, None).unwrap();
  let sink = ws.create_node(NodeType::Null, None, None).unwrap();
  ws.set_input(split, 0, t, 0).unwrap();
  ws.set_input(sink, 0, split, 0).unwrap();
  ws.set_parm(split, "delimiter", "").unwrap();

  assert_eq!(ws.eval(sink).unwrap(), Vec::<String>::new());
  let node = ws.node(split).unwrap();
  assert_eq!(node.state(), NodeState::Uncooked);
  assert_eq!(node.errors(), ["delimiter is empty".to_string()]);
  let sink_node = ws.node(sink).unwrap();
  assert_eq!(sink_node.errors().len(), 1);
  assert!(sink_node.errors()[0].contains("failed to cook"));
  assert_eq!(sink_node.cook_count(), 1);
  assert!(sink_node.last_cooked_at().is_some());
  assert!(sink_node.last_cook_time() >= 0.0);

  ws.set_parm(split, "delimiter", ",").unwrap();
  assert_eq!(ws.eval(sink).unwrap(), vec!["a", "b"]);
  assert!(ws.node(split).unwrap().errors().is_empty());
  assert!(ws.node(sink).unwrap().errors().is_empty());
}

#[test]
fn runtime_cycle_is_reported_not_looped() {
  let mut ws = Workspace::new();
  let a = ws.create_node(NodeType::Null, None, None).unwrap();
  let b = ws.create_node(NodeType::Null, None, None).unwrap();
  ws.set_input(b, 0, a, 0).unwrap();
  // bypass the connect-time check
  let back = Connection::new(b, 0, a, 0);
  let back_id = back.session_id();
  ws.connections.insert(back_id, back);
  ws.node_entry(a).unwrap().inputs.insert(0, back_id);

  ws.cook(a, false).unwrap();
  let node = ws.node(a).unwrap();
  assert_eq!(node.state(), NodeState::Uncooked);
  assert!(node.errors().iter().any(|e| e.contains("cycle detected")));
}

#[test]
fn disabled_node_passes_input_through() {
  let mut ws = Workspace::new();
  let t = text(&mut ws, "x");
  let search = ws.create_node(NodeType::Search, None, None).unwrap();
  ws.set_parm(search, "pattern", "nomatch").unwrap();
  ws.set_input(search, 0, t, 0).unwrap();
  assert!(ws.eval(search).unwrap().is_empty());
  ws.set_enabled(search, false).unwrap();
  assert_eq!(ws.eval(search).unwrap(), vec!["x"]);
}

#[test]
fn oversized_input_skips_the_dirty_check() {
  let config = EngineConfig {
    hash_size_limit: 4,
    ..EngineConfig::default()
  };
  let mut ws = Workspace::with_config(config);
  let t = text(&mut ws, "longer than four");
  let null = ws.create_node(NodeType::Null, None, None).unwrap();
  ws.set_input(null, 0, t, 0).unwrap();
  ws.eval(null).unwrap();
  let node = ws.node(null).unwrap();
  assert!(node.warnings()[0].contains("dirty check skipped"));
  assert!(ws.needs_to_cook(null).unwrap());
  ws.eval(null).unwrap();
  assert_eq!(ws.node(null).unwrap().cook_count(), 2);
}

#[test]
fn unresolved_tokens_become_warnings() {
  let mut ws = Workspace::new();
  let t = text(&mut ws, "Item $$N of $MISSING");
  assert_eq!(ws.eval(t).unwrap(), vec!["Item $$N of $MISSING"]);
  assert_eq!(ws.node(t).unwrap().warnings().len(), 2);
}

#[test]
fn parm_errors_are_typed() {
  let mut ws = Workspace::new();
  let t = text(&mut ws, "x");
  assert!(matches!(
    ws.set_parm(t, "nope", "v"),
    Err(crate::GraphError::ParmNotFound { .. })
  ));
  assert!(matches!(
    ws.set_parm(t, "pass_through", "v"),
    Err(crate::GraphError::ParmType { .. })
  ));
  ws.set_parm_json(t, "pass_through", &serde_json::json!(false)).unwrap();
  assert_eq!(
    ws.eval_parm(t, "pass_through").unwrap().value,
    ParmValue::Toggle(false)
  );
  ws.reset_parm(t, "pass_through").unwrap();
  assert!(ws.node(t).unwrap().parm("pass_through").unwrap().is_default());
  assert!(ws.press_button(t, "text_string").is_err());
}
