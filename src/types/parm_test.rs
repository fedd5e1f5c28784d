//! Tests for `Parm`.

use serde_json::json;

use super::{Parm, ParmType, ParmValue};
use crate::expression::{EvalContext, LoopScope};
use crate::globals::GlobalStore;

fn ctx(globals: &GlobalStore, nearest: Option<i64>) -> EvalContext<'_> {
  EvalContext::new(
    globals,
    LoopScope {
      nearest,
      outer: None,
      innermost: nearest,
    },
  )
}

#[test]
fn string_parm_tracks_default_flag() {
  let mut p = Parm::string("text_string", "hello");
  assert!(p.is_default());
  p.set("other".into()).unwrap();
  assert!(!p.is_default());
  p.set("hello".into()).unwrap();
  assert!(p.is_default());
  p.set("x".into()).unwrap();
  p.reset_to_default();
  assert_eq!(p.raw(), &ParmValue::Str("hello".to_string()));
  assert!(p.is_default());
}

#[test]
fn type_mismatch_is_rejected() {
  let mut p = Parm::toggle("strip", false);
  assert!(p.set("yes".into()).is_err());
  let mut p = Parm::string("text_string", "");
  assert!(p.set(ParmValue::Int(3)).is_err());
  assert_eq!(p.parm_type(), ParmType::String);
}

#[test]
fn menu_accepts_only_listed_items() {
  let mut p = Parm::menu("mode", &["fast", "slow"], "fast");
  p.set("slow".into()).unwrap();
  let err = p.set("medium".into()).unwrap_err();
  assert!(err.contains("medium"));
  assert_eq!(p.menu_items(), ["fast".to_string(), "slow".to_string()]);
}

#[test]
fn string_eval_is_recomputed_per_context() {
  let g = GlobalStore::new();
  let mut p = Parm::string("text_string", "");
  p.set("Item $$N".into()).unwrap();
  assert_eq!(p.eval(&ctx(&g, Some(1))).value, ParmValue::Str("Item 1".into()));
  assert_eq!(p.eval(&ctx(&g, Some(2))).value, ParmValue::Str("Item 2".into()));
  let outside = p.eval(&ctx(&g, None));
  assert_eq!(outside.value, ParmValue::Str("Item $$N".into()));
  assert_eq!(outside.diagnostics.len(), 1);
}

#[test]
fn int_parm_accepts_expressions() {
  let mut g = GlobalStore::new();
  g.set("COUNT", "4").unwrap();
  let mut p = Parm::int("max", 1);
  p.set("$COUNT".into()).unwrap();
  assert_eq!(p.eval(&ctx(&g, None)).value, ParmValue::Int(4));
  p.set(ParmValue::Int(9)).unwrap();
  assert_eq!(p.eval(&ctx(&g, None)).value.as_int(), Some(9));
}

#[test]
fn string_list_evaluates_each_item() {
  let mut g = GlobalStore::new();
  g.set("NAME", "bob").unwrap();
  let p = Parm::string_list("lines", &["hi $NAME", "#$$N"]);
  let ev = p.eval(&ctx(&g, Some(3)));
  assert_eq!(
    ev.value,
    ParmValue::StringList(vec!["hi bob".to_string(), "#3".to_string()])
  );
  assert_eq!(p.templates().len(), 2);
}

#[test]
fn from_json_converts_by_type() {
  assert_eq!(
    ParmValue::from_json(ParmType::Int, &json!("12")).unwrap(),
    ParmValue::Int(12)
  );
  assert_eq!(
    ParmValue::from_json(ParmType::Int, &json!("$MAX")).unwrap(),
    ParmValue::Str("$MAX".to_string())
  );
  assert_eq!(
    ParmValue::from_json(ParmType::Toggle, &json!("on")).unwrap(),
    ParmValue::Toggle(true)
  );
  assert_eq!(
    ParmValue::from_json(ParmType::StringList, &json!(["a", "b"])).unwrap(),
    ParmValue::StringList(vec!["a".to_string(), "b".to_string()])
  );
  assert!(ParmValue::from_json(ParmType::Toggle, &json!("maybe")).is_err());
  assert!(ParmValue::from_json(ParmType::Button, &json!(1)).is_err());
}
