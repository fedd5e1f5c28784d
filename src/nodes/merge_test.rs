use crate::types::{NodeId, NodeType};
use crate::workspace::Workspace;

fn text(ws: &mut Workspace, value: &str) -> NodeId {
  let id = ws.create_node(NodeType::Text, None, None).unwrap();
  ws.set_parm(id, "text_string", value).unwrap();
  id
}

#[test]
fn merge_concatenates_in_port_order() {
  let mut ws = Workspace::new();
  let a = text(&mut ws, "a");
  let b = text(&mut ws, "b");
  let merge = ws.create_node(NodeType::Merge, None, None).unwrap();
  ws.set_input(merge, 0, b, 0).unwrap();
  ws.set_input(merge, 1, a, 0).unwrap();
  assert_eq!(ws.eval(merge).unwrap(), vec!["b", "a"]);
}

#[test]
fn single_string_joins_with_separator() {
  let mut ws = Workspace::new();
  let a = text(&mut ws, "a");
  let b = text(&mut ws, "b");
  let merge = ws.create_node(NodeType::Merge, None, None).unwrap();
  ws.set_input(merge, 0, a, 0).unwrap();
  ws.set_input(merge, 1, b, 0).unwrap();
  ws.set_parm(merge, "single_string", true).unwrap();
  assert_eq!(ws.eval(merge).unwrap(), vec!["a\nb"]);
  ws.set_parm(merge, "separator", ", ").unwrap();
  assert_eq!(ws.eval(merge).unwrap(), vec!["a, b"]);
}

#[test]
fn unconnected_merge_is_empty() {
  let mut ws = Workspace::new();
  let merge = ws.create_node(NodeType::Merge, None, None).unwrap();
  ws.set_parm(merge, "single_string", true).unwrap();
  assert!(ws.eval(merge).unwrap().is_empty());
}
