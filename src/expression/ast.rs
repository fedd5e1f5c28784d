//! Expression AST and its evaluation.

use std::fmt;

use super::{EvalContext, Evaluated, snippet};

/// Loop variable tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopToken {
  N,
  L,
  M,
}

impl fmt::Display for LoopToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LoopToken::N => write!(f, "$$N"),
      LoopToken::L => write!(f, "$$L"),
      LoopToken::M => write!(f, "$$M"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
  Add,
  Sub,
  Mul,
}

impl ArithOp {
  pub(crate) fn from_char(c: char) -> Option<Self> {
    match c {
      '+' => Some(ArithOp::Add),
      '-' => Some(ArithOp::Sub),
      '*' => Some(ArithOp::Mul),
      _ => None,
    }
  }

  fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
    match self {
      ArithOp::Add => lhs.checked_add(rhs),
      ArithOp::Sub => lhs.checked_sub(rhs),
      ArithOp::Mul => lhs.checked_mul(rhs),
    }
  }
}

/// One operand of an arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
  Loop(LoopToken),
  /// `$NAME`: must exist in the global store.
  Global(String),
  /// Bare word: a global key if present, else an integer literal.
  Word(String),
  Int(i64),
  Braced(Box<Arith>),
}

/// `operand (op operand)*`, folded left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Arith {
  pub first: Operand,
  pub rest: Vec<(ArithOp, Operand)>,
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
  Literal(String),
  /// `$$N` style token, optionally followed by arithmetic.
  Loop { arith: Arith, source: String },
  /// `$NAME`.
  Global { name: String, source: String },
  /// `${...}`.
  Braced { arith: Arith, source: String },
  /// `` `...` ``; the body is itself a template rendered before the snippet runs.
  Snippet { body: Template, source: String },
}

/// A parsed parm string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
  pub segments: Vec<Segment>,
}

/// Result of resolving an operand.
#[derive(Debug, Clone, PartialEq)]
enum Resolved {
  Int(i64),
  Text(String),
}

impl Resolved {
  fn into_string(self) -> String {
    match self {
      Resolved::Int(i) => i.to_string(),
      Resolved::Text(s) => s,
    }
  }
}

impl Template {
  /// True when the template is plain text with no tokens.
  pub fn is_literal(&self) -> bool {
    self
      .segments
      .iter()
      .all(|s| matches!(s, Segment::Literal(_)))
  }

  /// Renders the template against `ctx`. Unresolved tokens stay as written.
  pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Evaluated<String> {
    let mut value = String::new();
    let mut diagnostics = Vec::new();
    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => value.push_str(text),
        Segment::Loop { arith, source } | Segment::Braced { arith, source } => {
          match eval_arith(arith, ctx) {
            Ok(r) => value.push_str(&r.into_string()),
            Err(e) => {
              diagnostics.push(format!("{source}: {e}"));
              value.push_str(source);
            }
          }
        }
        Segment::Global { name, source } => match ctx.globals.get(name) {
          Some(v) => value.push_str(v),
          None => {
            diagnostics.push(format!("{source}: global {name} is not set"));
            value.push_str(source);
          }
        },
        Segment::Snippet { body, source } => {
          let rendered = body.evaluate(ctx);
          diagnostics.extend(rendered.diagnostics);
          match snippet::eval_snippet(&rendered.value) {
            Ok(out) => value.push_str(&out),
            Err(e) => {
              diagnostics.push(format!("{source}: {e}"));
              value.push_str(source);
            }
          }
        }
      }
    }
    Evaluated { value, diagnostics }
  }
}

fn resolve_operand(operand: &Operand, ctx: &EvalContext<'_>) -> Result<Resolved, String> {
  match operand {
    Operand::Loop(token) => {
      let v = match token {
        LoopToken::N => ctx.scope.nearest,
        LoopToken::L => ctx.scope.innermost,
        LoopToken::M => ctx.scope.outer,
      };
      v.map(Resolved::Int)
        .ok_or_else(|| format!("{token} is not inside an active loop"))
    }
    Operand::Global(name) => ctx
      .globals
      .get(name)
      .map(text_or_int)
      .ok_or_else(|| format!("global {name} is not set")),
    Operand::Word(word) => {
      if let Some(v) = ctx.globals.get(word) {
        return Ok(text_or_int(v));
      }
      word
        .parse::<i64>()
        .map(Resolved::Int)
        .map_err(|_| format!("{word} is neither a global nor an integer"))
    }
    Operand::Int(i) => Ok(Resolved::Int(*i)),
    Operand::Braced(inner) => eval_arith(inner, ctx),
  }
}

fn text_or_int(s: &str) -> Resolved {
  s.trim()
    .parse::<i64>()
    .map(Resolved::Int)
    .unwrap_or_else(|_| Resolved::Text(s.to_string()))
}

fn eval_arith(arith: &Arith, ctx: &EvalContext<'_>) -> Result<Resolved, String> {
  let first = resolve_operand(&arith.first, ctx)?;
  if arith.rest.is_empty() {
    return Ok(first);
  }
  let mut acc = match first {
    Resolved::Int(i) => i,
    Resolved::Text(t) => return Err(format!("{t:?} is not numeric")),
  };
  for (op, operand) in &arith.rest {
    let rhs = match resolve_operand(operand, ctx)? {
      Resolved::Int(i) => i,
      Resolved::Text(t) => return Err(format!("{t:?} is not numeric")),
    };
    acc = op.apply(acc, rhs).ok_or("arithmetic overflow")?;
  }
  Ok(Resolved::Int(acc))
}
