//! Template parser.
//!
//! Anything that does not parse as a token is kept as literal text, so parsing never fails.

use super::ast::{Arith, ArithOp, LoopToken, Operand, Segment, Template};

/// Parses a raw parm string into a [Template].
pub fn parse_template(source: &str) -> Template {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = source;

  while let Some(c) = rest.chars().next() {
    match c {
      '\\' if rest[1..].starts_with(['$', '`']) => {
        literal.push_str(&rest[1..2]);
        rest = &rest[2..];
      }
      '$' => match parse_dollar(rest) {
        Some((segment, after)) => {
          flush_literal(&mut literal, &mut segments);
          segments.push(segment);
          rest = after;
        }
        None => {
          literal.push('$');
          rest = &rest[1..];
        }
      },
      '`' => match parse_snippet(rest) {
        Some((segment, after)) => {
          flush_literal(&mut literal, &mut segments);
          segments.push(segment);
          rest = after;
        }
        None => {
          literal.push('`');
          rest = &rest[1..];
        }
      },
      _ => {
        literal.push(c);
        rest = &rest[c.len_utf8()..];
      }
    }
  }
  flush_literal(&mut literal, &mut segments);
  Template { segments }
}

fn flush_literal(literal: &mut String, segments: &mut Vec<Segment>) {
  if !literal.is_empty() {
    segments.push(Segment::Literal(std::mem::take(literal)));
  }
}

/// Parses a token starting at `$`. Returns the segment and the unconsumed remainder.
fn parse_dollar(s: &str) -> Option<(Segment, &str)> {
  if let Some((token, mut rest)) = parse_loop_token(s) {
    let mut ops = Vec::new();
    while let Some((op, operand, after)) = parse_trailing_op(rest) {
      ops.push((op, operand));
      rest = after;
    }
    let source = s[..s.len() - rest.len()].to_string();
    let arith = Arith {
      first: Operand::Loop(token),
      rest: ops,
    };
    return Some((Segment::Loop { arith, source }, rest));
  }
  if s.starts_with("${") {
    let (inner, rest) = braced_body(s)?;
    let arith = parse_arith(inner)?;
    let source = s[..s.len() - rest.len()].to_string();
    return Some((Segment::Braced { arith, source }, rest));
  }
  let (name, rest) = parse_global_key(&s[1..])?;
  Some((
    Segment::Global {
      name: name.to_string(),
      source: format!("${name}"),
    },
    rest,
  ))
}

/// `$$N`, `$$L` or `$$M`.
pub(crate) fn parse_loop_token(s: &str) -> Option<(LoopToken, &str)> {
  let rest = s.strip_prefix("$$")?;
  let token = match rest.chars().next()? {
    'N' => LoopToken::N,
    'L' => LoopToken::L,
    'M' => LoopToken::M,
    _ => return None,
  };
  Some((token, &rest[1..]))
}

/// An operator glued to a word, e.g. `+1` or `*ACTORS` or `+$COUNT`.
fn parse_trailing_op(s: &str) -> Option<(ArithOp, Operand, &str)> {
  let op = ArithOp::from_char(s.chars().next()?)?;
  let rest = &s[1..];
  if let Some((name, after)) = rest.strip_prefix('$').and_then(parse_global_key) {
    return Some((op, Operand::Global(name.to_string()), after));
  }
  let end = rest
    .find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
    .unwrap_or(rest.len());
  if end == 0 {
    return None;
  }
  Some((op, word_operand(&rest[..end]), &rest[end..]))
}

fn word_operand(word: &str) -> Operand {
  match word.parse::<i64>() {
    Ok(i) => Operand::Int(i),
    Err(_) => Operand::Word(word.to_string()),
  }
}

/// A run of ASCII alphanumerics and underscores.
pub(crate) fn parse_word(s: &str) -> Option<(&str, &str)> {
  let end = s
    .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
    .unwrap_or(s.len());
  if end == 0 {
    None
  } else {
    Some((&s[..end], &s[end..]))
  }
}

/// A global key: an uppercase letter followed by at least one uppercase letter, digit or `_`.
pub(crate) fn parse_global_key(s: &str) -> Option<(&str, &str)> {
  let end = s
    .find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
    .unwrap_or(s.len());
  let key = &s[..end];
  if key.len() >= 2 && key.starts_with(|c: char| c.is_ascii_uppercase()) {
    Some((key, &s[end..]))
  } else {
    None
  }
}

/// Splits `${...}` into its inner text and the remainder, honouring nested braces.
fn braced_body(s: &str) -> Option<(&str, &str)> {
  let body = s.strip_prefix("${")?;
  let mut depth = 1;
  for (i, c) in body.char_indices() {
    match c {
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          return Some((&body[..i], &body[i + 1..]));
        }
      }
      _ => {}
    }
  }
  None
}

/// Parses the body of `${...}`: `operand (op operand)*` with optional whitespace.
pub(crate) fn parse_arith(s: &str) -> Option<Arith> {
  let (first, mut rest) = parse_operand(s.trim_start())?;
  let mut ops = Vec::new();
  loop {
    rest = rest.trim_start();
    if rest.is_empty() {
      break;
    }
    let op = ArithOp::from_char(rest.chars().next()?)?;
    let (operand, after) = parse_operand(rest[1..].trim_start())?;
    ops.push((op, operand));
    rest = after;
  }
  Some(Arith { first, rest: ops })
}

fn parse_operand(s: &str) -> Option<(Operand, &str)> {
  if let Some((token, rest)) = parse_loop_token(s) {
    return Some((Operand::Loop(token), rest));
  }
  if s.starts_with("${") {
    let (inner, rest) = braced_body(s)?;
    return Some((Operand::Braced(Box::new(parse_arith(inner)?)), rest));
  }
  if let Some(after) = s.strip_prefix('$') {
    let (name, rest) = parse_global_key(after)?;
    return Some((Operand::Global(name.to_string()), rest));
  }
  if let Some(digits) = s.strip_prefix('-') {
    let (word, rest) = parse_word(digits)?;
    let value = word.parse::<i64>().ok()?;
    return Some((Operand::Int(-value), rest));
  }
  let (word, rest) = parse_word(s)?;
  Some((word_operand(word), rest))
}

/// Parses `` `...` `` up to the next unescaped backtick.
fn parse_snippet(s: &str) -> Option<(Segment, &str)> {
  let body = s.strip_prefix('`')?;
  let mut escaped = false;
  for (i, c) in body.char_indices() {
    match c {
      '\\' if !escaped => escaped = true,
      '`' if !escaped => {
        let inner = &body[..i];
        let source = s[..i + 2].to_string();
        return Some((
          Segment::Snippet {
            body: parse_template(inner),
            source,
          },
          &body[i + 1..],
        ));
      }
      _ => escaped = false,
    }
  }
  None
}
