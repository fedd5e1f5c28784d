use std::fs;

use super::FileOut;
use crate::types::{NodeId, NodeType};
use crate::workspace::Workspace;

fn writer(ws: &mut Workspace, items: &str, path: &str) -> NodeId {
  let text = ws.create_node(NodeType::Text, None, None).unwrap();
  ws.set_parm(text, "text_string", items).unwrap();
  let split = ws.create_node(NodeType::Split, None, None).unwrap();
  ws.set_parm(split, "delimiter", ",").unwrap();
  ws.set_input(split, 0, text, 0).unwrap();
  let out = ws.create_node(NodeType::FileOut, None, None).unwrap();
  ws.set_parm(out, "file_path", path).unwrap();
  ws.set_input(out, 0, split, 0).unwrap();
  out
}

#[test]
fn writes_items_and_passes_them_through() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested").join("out.txt");
  let mut ws = Workspace::new();
  let out = writer(&mut ws, "a,b", path.to_str().unwrap());
  assert_eq!(ws.eval(out).unwrap(), vec!["a", "b"]);
  assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb");

  // a cached cook does not write again
  ws.eval(out).unwrap();
  assert_eq!(ws.behavior::<FileOut>(out).unwrap().writes(), 1);
}

#[test]
fn append_adds_a_separator_between_writes() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("log.txt");
  let mut ws = Workspace::new();
  let out = writer(&mut ws, "a,b", path.to_str().unwrap());
  ws.set_parm(out, "append", true).unwrap();
  ws.set_parm(out, "separator", ";").unwrap();
  ws.eval(out).unwrap();
  ws.cook(out, true).unwrap();
  assert_eq!(fs::read_to_string(&path).unwrap(), "a;b;a;b");
}

#[test]
fn overwrite_truncates() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("out.txt");
  fs::write(&path, "old content that is long").unwrap();
  let mut ws = Workspace::new();
  let out = writer(&mut ws, "new", path.to_str().unwrap());
  ws.eval(out).unwrap();
  assert_eq!(fs::read_to_string(&path).unwrap(), "new");
}
