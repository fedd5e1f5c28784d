//! Tests for the path registry.

use crate::error::GraphError;
use crate::types::NodeType;
use crate::workspace::{RegistryEvent, Workspace, is_within, join_path, normalize_path, parent_path, path_name};

#[test]
fn path_helpers() {
  assert_eq!(path_name("/a/b"), "b");
  assert_eq!(parent_path("/a/b"), "/a");
  assert_eq!(parent_path("/a"), "/");
  assert_eq!(join_path("/", "a"), "/a");
  assert_eq!(join_path("/a", "b"), "/a/b");
  assert_eq!(normalize_path("a/b/"), "/a/b");
  assert_eq!(normalize_path(""), "/");
  assert!(is_within("/a/b", "/a"));
  assert!(is_within("/a", "/a"));
  assert!(!is_within("/ab", "/a"));
}

#[test]
fn default_names_and_dedupe() {
  let mut ws = Workspace::new();
  let a = ws.create_node(NodeType::Text, None, None).unwrap();
  let b = ws.create_node(NodeType::Text, None, None).unwrap();
  let c = ws.create_node(NodeType::Text, Some("text1"), None).unwrap();
  assert_eq!(ws.node(a).unwrap().path(), "/text1");
  assert_eq!(ws.node(b).unwrap().path(), "/text2");
  assert_eq!(ws.node(c).unwrap().path(), "/text3");
  let d = ws.create_node(NodeType::Null, Some("tap"), None).unwrap();
  let e = ws.create_node(NodeType::Null, Some("tap"), None).unwrap();
  assert_eq!(ws.node(d).unwrap().path(), "/tap");
  assert_eq!(ws.node(e).unwrap().path(), "/tap1");
}

#[test]
fn invalid_names_and_parents_are_rejected() {
  let mut ws = Workspace::new();
  assert!(matches!(
    ws.create_node(NodeType::Text, Some("a/b"), None),
    Err(GraphError::InvalidName(_))
  ));
  assert!(matches!(
    ws.create_node(NodeType::Text, Some(""), None),
    Err(GraphError::InvalidName(_))
  ));
  ws.create_node(NodeType::Text, Some("plain"), None).unwrap();
  assert!(matches!(
    ws.create_node(NodeType::Text, None, Some("/plain")),
    Err(GraphError::NotAComposite(_))
  ));
  assert!(matches!(
    ws.create_node(NodeType::Text, None, Some("/missing")),
    Err(GraphError::NodeNotFound(_))
  ));
  assert!(matches!(
    ws.create_node_from_str("spline", None, None),
    Err(GraphError::UnknownNodeType(_))
  ));
}

#[test]
fn looper_creates_permanent_relays_with_one_event() {
  let mut ws = Workspace::new();
  let looper = ws.create_node(NodeType::Looper, None, None).unwrap();
  assert!(ws.node(looper).unwrap().is_composite());
  assert_eq!(
    ws.list_nodes(),
    vec!["/looper1", "/looper1/input", "/looper1/output"]
  );
  assert!(ws.node_by_path("/looper1/input").unwrap().is_permanent());
  assert_eq!(ws.children("/looper1").len(), 2);

  let events = ws.drain_events();
  assert_eq!(
    events,
    vec![RegistryEvent::Created {
      path: "/looper1".to_string(),
      node_type: NodeType::Looper,
      children: vec!["/looper1/input".to_string(), "/looper1/output".to_string()],
    }]
  );
  assert!(ws.drain_events().is_empty());
}

#[test]
fn node_from_name_prefers_paths_and_warns_on_ambiguity() {
  let mut ws = Workspace::new();
  ws.create_node(NodeType::Looper, Some("outer"), None).unwrap();
  ws.create_node(NodeType::Looper, Some("inner"), None).unwrap();
  let a = ws.create_node(NodeType::Text, Some("item"), Some("/inner")).unwrap();
  let b = ws.create_node(NodeType::Text, Some("item"), Some("/outer")).unwrap();

  assert_eq!(ws.node_from_name("/outer/item"), Some(b));
  assert_eq!(ws.node_from_name("outer/item"), Some(b));
  assert!(ws.node(b).unwrap().warnings().is_empty());

  assert_eq!(ws.node_from_name("item"), Some(a));
  let warnings = ws.node(a).unwrap().warnings();
  assert_eq!(warnings.len(), 1);
  assert!(warnings[0].contains("/outer/item"));
  assert_eq!(ws.node_from_name("nothing"), None);
}

#[test]
fn remove_node_cascades_and_detaches() {
  let mut ws = Workspace::new();
  let src = ws.create_node(NodeType::Text, Some("src"), None).unwrap();
  let looper = ws.create_node(NodeType::Looper, None, None).unwrap();
  let inner = ws.create_node(NodeType::Text, None, Some("/looper1")).unwrap();
  let sink = ws.create_node(NodeType::Null, None, None).unwrap();
  ws.set_input(looper, 0, src, 0).unwrap();
  ws.set_input(sink, 0, looper, 0).unwrap();
  let relay = ws.id_of("/looper1/output").unwrap();
  ws.set_input(relay, 0, inner, 0).unwrap();
  ws.drain_events();

  let removed = ws.remove_node("/looper1").unwrap();
  assert_eq!(
    removed,
    vec![
      "/looper1",
      "/looper1/input",
      "/looper1/output",
      "/looper1/text1"
    ]
  );
  assert!(!ws.node_exists("/looper1/text1"));
  assert_eq!(ws.connections().count(), 0);
  assert!(ws.node(src).unwrap().outputs().is_empty());
  assert!(ws.node(sink).unwrap().inputs().is_empty());
  assert_eq!(
    ws.drain_events(),
    vec![RegistryEvent::Removed {
      paths: removed.clone()
    }]
  );
}

#[test]
fn relays_cannot_be_removed_or_moved_alone() {
  let mut ws = Workspace::new();
  ws.create_node(NodeType::Looper, None, None).unwrap();
  assert!(matches!(
    ws.remove_node("/looper1/input"),
    Err(GraphError::PermanentChild(_))
  ));
  assert!(matches!(
    ws.rename_node("/looper1/output", "out"),
    Err(GraphError::PermanentChild(_))
  ));
}

#[test]
fn rename_and_move_rewrite_subtree() {
  let mut ws = Workspace::new();
  ws.create_node(NodeType::Looper, Some("a"), None).unwrap();
  ws.create_node(NodeType::Looper, Some("b"), None).unwrap();
  let inner = ws.create_node(NodeType::Text, Some("t"), Some("/a")).unwrap();
  ws.drain_events();

  let moved = ws.set_parent("/a", "/b").unwrap();
  assert_eq!(moved, "/b/a");
  assert_eq!(ws.node(inner).unwrap().path(), "/b/a/t");
  assert!(ws.node_exists("/b/a/input"));
  assert!(!ws.node_exists("/a"));

  let renamed = ws.rename_node("/b/a", "c").unwrap();
  assert_eq!(renamed, "/b/c");
  assert_eq!(ws.node(inner).unwrap().path(), "/b/c/t");
  assert_eq!(ws.node(inner).unwrap().name(), "t");
  assert_eq!(ws.node(inner).unwrap().parent_path(), "/b/c");

  assert_eq!(
    ws.drain_events(),
    vec![
      RegistryEvent::Renamed {
        old_path: "/a".to_string(),
        new_path: "/b/a".to_string()
      },
      RegistryEvent::Renamed {
        old_path: "/b/a".to_string(),
        new_path: "/b/c".to_string()
      },
    ]
  );
}

#[test]
fn move_dedupes_against_new_siblings() {
  let mut ws = Workspace::new();
  ws.create_node(NodeType::Looper, Some("box"), None).unwrap();
  ws.create_node(NodeType::Text, Some("t"), Some("/box")).unwrap();
  let top = ws.create_node(NodeType::Text, Some("t"), None).unwrap();
  assert_eq!(ws.set_parent("/t", "/box").unwrap(), "/box/t1");
  assert_eq!(ws.node(top).unwrap().path(), "/box/t1");
}

#[test]
fn cannot_move_into_own_subtree() {
  let mut ws = Workspace::new();
  ws.create_node(NodeType::Looper, Some("a"), None).unwrap();
  ws.create_node(NodeType::Looper, Some("b"), Some("/a")).unwrap();
  assert!(matches!(
    ws.set_parent("/a", "/a/b"),
    Err(GraphError::InvalidMove { .. })
  ));
}

#[test]
fn flush_all_keeps_globals() {
  let mut ws = Workspace::new();
  ws.globals_mut().set("FOO", "1").unwrap();
  ws.create_node(NodeType::Looper, None, None).unwrap();
  ws.flush_all();
  assert!(ws.is_empty());
  assert_eq!(ws.connections().count(), 0);
  assert_eq!(ws.globals().get("FOO"), Some("1"));
}

#[test]
fn descendants_are_in_path_order() {
  let mut ws = Workspace::new();
  ws.create_node(NodeType::Looper, Some("a"), None).unwrap();
  ws.create_node(NodeType::Looper, Some("b"), Some("/a")).unwrap();
  let paths: Vec<String> = ws
    .descendants("/a")
    .into_iter()
    .map(|id| ws.node(id).unwrap().path().to_string())
    .collect();
  assert_eq!(
    paths,
    vec!["/a/b", "/a/b/input", "/a/b/output", "/a/input", "/a/output"]
  );
}
