//! Parameter expression language.
//!
//! A raw parm string is parsed once into a [Template] and evaluated against an
//! [EvalContext] on every parm evaluation. Supported forms, resolved left to right:
//!
//! - `$$N`, `$$L`, `$$M`: iteration value of the nearest enclosing looper, of the
//!   innermost active loop, and of the looper one nesting level further out.
//! - `$$N+1`, `$$M*211`, `$$M+ACTORS`: arithmetic on a loop token. The right operand is a
//!   global key if one exists, else an integer literal.
//! - `$NAME`: global substitution. `${$NAME}` and `${$NAME op expr}` evaluate the braces first.
//! - `` `len("abc")` ``: inline snippet evaluated by a small whitelisted function set.
//!
//! Evaluation never fails. Tokens that cannot be resolved are left in place and reported
//! as diagnostics for the owning node to record.

mod ast;
#[cfg(test)]
mod eval_test;
mod parser;
#[cfg(test)]
mod parser_test;
mod snippet;

pub use ast::{Arith, ArithOp, LoopToken, Operand, Segment, Template};
pub use parser::parse_template;
pub use snippet::eval_snippet;

use crate::globals::GlobalStore;

/// Loop indices visible from one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LoopScope {
  /// Value of the nearest enclosing looper (`$$N`).
  pub nearest: Option<i64>,
  /// Value of the looper one level further out (`$$M`).
  pub outer: Option<i64>,
  /// Value of the innermost loop currently running anywhere (`$$L`).
  pub innermost: Option<i64>,
}

/// Ambient context an expression is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
  pub globals: &'a GlobalStore,
  pub scope: LoopScope,
}

impl<'a> EvalContext<'a> {
  pub fn new(globals: &'a GlobalStore, scope: LoopScope) -> Self {
    Self { globals, scope }
  }
}

/// Value produced by evaluation plus any diagnostics for unresolved tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated<T> {
  pub value: T,
  pub diagnostics: Vec<String>,
}

/// Parses and evaluates `source` in one step.
pub fn evaluate(source: &str, ctx: &EvalContext<'_>) -> Evaluated<String> {
  parse_template(source).evaluate(ctx)
}
