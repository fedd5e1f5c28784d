//! Tests for template evaluation.

use proptest::prelude::*;

use super::{EvalContext, LoopScope, evaluate};
use crate::globals::GlobalStore;

fn globals() -> GlobalStore {
  let mut g = GlobalStore::new();
  g.set("FOO", "7").unwrap();
  g.set("ACTORS", "10").unwrap();
  g.set("NAME", "bob").unwrap();
  g
}

fn scope(nearest: i64, outer: Option<i64>) -> LoopScope {
  LoopScope {
    nearest: Some(nearest),
    outer,
    innermost: Some(nearest),
  }
}

#[test]
fn global_substitution() {
  let g = globals();
  let ctx = EvalContext::new(&g, LoopScope::default());
  let ev = evaluate("$FOO", &ctx);
  assert_eq!(ev.value, "7");
  assert!(ev.diagnostics.is_empty());
}

#[test]
fn loop_tokens_resolve_from_scope() {
  let g = globals();
  let ctx = EvalContext::new(&g, scope(2, Some(5)));
  assert_eq!(evaluate("Item $$N", &ctx).value, "Item 2");
  assert_eq!(evaluate("$$M/$$N/$$L", &ctx).value, "5/2/2");
}

#[test]
fn loop_arithmetic() {
  let g = globals();
  let ctx = EvalContext::new(&g, scope(3, Some(2)));
  assert_eq!(evaluate("$$N+1", &ctx).value, "4");
  assert_eq!(evaluate("$$M*211", &ctx).value, "422");
  assert_eq!(evaluate("$$M+ACTORS", &ctx).value, "12");
  assert_eq!(evaluate("$$N-1*2", &ctx).value, "4");
}

#[test]
fn braced_expressions() {
  let g = globals();
  let ctx = EvalContext::new(&g, scope(3, None));
  assert_eq!(evaluate("${$FOO}", &ctx).value, "7");
  assert_eq!(evaluate("${$FOO + 1}", &ctx).value, "8");
  assert_eq!(evaluate("${$NAME}!", &ctx).value, "bob!");
  assert_eq!(evaluate("${$$N * ${$FOO - 5}}", &ctx).value, "6");
}

#[test]
fn unresolved_tokens_stay_and_report() {
  let g = globals();
  let ctx = EvalContext::new(&g, LoopScope::default());
  let ev = evaluate("Item $$N of $MISSING", &ctx);
  assert_eq!(ev.value, "Item $$N of $MISSING");
  assert_eq!(ev.diagnostics.len(), 2);
  assert!(ev.diagnostics[0].contains("not inside an active loop"));
  assert!(ev.diagnostics[1].contains("MISSING"));
}

#[test]
fn non_numeric_arithmetic_is_reported() {
  let g = globals();
  let ctx = EvalContext::new(&g, LoopScope::default());
  let ev = evaluate("${$NAME + 1}", &ctx);
  assert_eq!(ev.value, "${$NAME + 1}");
  assert_eq!(ev.diagnostics.len(), 1);
}

#[test]
fn snippets_see_substituted_values() {
  let g = globals();
  let ctx = EvalContext::new(&g, scope(4, None));
  assert_eq!(evaluate("`len(\"$NAME\")`", &ctx).value, "3");
  assert_eq!(evaluate("`upper(\"$NAME\") + \"-\" + $$N`", &ctx).value, "BOB-4");
}

#[test]
fn failing_snippet_is_left_in_place() {
  let g = globals();
  let ctx = EvalContext::new(&g, LoopScope::default());
  let ev = evaluate("a `system(\"ls\")` b", &ctx);
  assert_eq!(ev.value, "a `system(\"ls\")` b");
  assert_eq!(ev.diagnostics.len(), 1);
}

proptest! {
  #[test]
  fn text_without_specials_passes_through(s in "[a-zA-Z0-9 ,.:;!?()-]{0,40}") {
    let g = GlobalStore::new();
    let ctx = EvalContext::new(&g, LoopScope::default());
    let ev = evaluate(&s, &ctx);
    prop_assert_eq!(ev.value, s);
    prop_assert!(ev.diagnostics.is_empty());
  }

  #[test]
  fn evaluation_never_panics(s in "\\PC{0,40}") {
    let g = globals();
    let ctx = EvalContext::new(&g, scope(1, Some(2)));
    let _ = evaluate(&s, &ctx);
  }
}
