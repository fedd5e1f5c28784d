use serde_json::json;

use super::json::extract;
use crate::types::NodeType;
use crate::workspace::Workspace;

#[test]
fn extract_walks_objects_and_arrays() {
  let value = json!({"a": {"b": [10, {"c": "deep"}]}});
  assert_eq!(extract(&value, "a.b.1.c"), Some(&json!("deep")));
  assert_eq!(extract(&value, "a.b.0"), Some(&json!(10)));
  assert_eq!(extract(&value, ""), Some(&value));
  assert_eq!(extract(&value, "a.x"), None);
  assert_eq!(extract(&value, "a.b.9"), None);
}

#[test]
fn json_node_emits_strings_raw_and_values_serialized() {
  let mut ws = Workspace::new();
  let first = ws.create_node(NodeType::Text, None, None).unwrap();
  ws.set_parm(first, "text_string", r#"{"name": "ada", "tags": ["x"]}"#).unwrap();
  let second = ws.create_node(NodeType::Text, None, None).unwrap();
  ws.set_parm(second, "text_string", r#"{"other": 1}"#).unwrap();
  ws.set_input(second, 0, first, 0).unwrap();
  let json = ws.create_node(NodeType::Json, None, None).unwrap();
  ws.set_input(json, 0, second, 0).unwrap();

  ws.set_parm(json, "path", "name").unwrap();
  assert_eq!(ws.eval(json).unwrap(), vec!["ada"]);
  assert_eq!(
    ws.node(json).unwrap().warnings(),
    [r#"item 1: path "name" not found"#.to_string()]
  );

  ws.set_parm(json, "path", "tags").unwrap();
  assert_eq!(ws.eval(json).unwrap(), vec![r#"["x"]"#]);
}

#[test]
fn invalid_json_fails_the_cook() {
  let mut ws = Workspace::new();
  let text = ws.create_node(NodeType::Text, None, None).unwrap();
  ws.set_parm(text, "text_string", "not json").unwrap();
  let json = ws.create_node(NodeType::Json, None, None).unwrap();
  ws.set_input(json, 0, text, 0).unwrap();
  ws.cook(json, false).unwrap();
  assert!(ws.node(json).unwrap().errors()[0].starts_with("item 0: invalid JSON"));
}
