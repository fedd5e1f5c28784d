use crate::types::NodeType;
use crate::workspace::Workspace;

#[test]
fn text_appends_after_input() {
  let mut ws = Workspace::new();
  let first = ws.create_node(NodeType::Text, None, None).unwrap();
  ws.set_parm(first, "text_string", "one").unwrap();
  let second = ws.create_node(NodeType::Text, None, None).unwrap();
  ws.set_parm(second, "text_string", "two").unwrap();
  ws.set_input(second, 0, first, 0).unwrap();
  assert_eq!(ws.eval(second).unwrap(), vec!["one", "two"]);

  ws.set_parm(second, "pass_through", false).unwrap();
  assert_eq!(ws.eval(second).unwrap(), vec!["two"]);
}

#[test]
fn empty_text_adds_nothing() {
  let mut ws = Workspace::new();
  let id = ws.create_node(NodeType::Text, None, None).unwrap();
  assert!(ws.eval(id).unwrap().is_empty());
}

#[test]
fn text_expands_globals() {
  let mut ws = Workspace::new();
  ws.globals_mut().set("NAME", "ada").unwrap();
  let id = ws.create_node(NodeType::Text, None, None).unwrap();
  ws.set_parm(id, "text_string", "hi $NAME").unwrap();
  assert_eq!(ws.eval(id).unwrap(), vec!["hi ada"]);
  assert!(ws.node(id).unwrap().warnings().is_empty());
}
