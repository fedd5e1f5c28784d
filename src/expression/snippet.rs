//! Inline snippet evaluator for backtick segments.
//!
//! Grammar:
//!
//! ```text
//! expr  := term ('+' term)*
//! term  := string | integer | call | '(' expr ')'
//! call  := name '(' [expr (',' expr)*] ')'
//! ```
//!
//! Only the functions in [call_function] exist. `+` adds integers and concatenates anything else.

/// Largest string a snippet may produce.
const MAX_OUTPUT_LEN: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq)]
enum SnippetValue {
  Str(String),
  Int(i64),
}

impl SnippetValue {
  fn into_string(self) -> String {
    match self {
      SnippetValue::Str(s) => s,
      SnippetValue::Int(i) => i.to_string(),
    }
  }

  fn as_string(&self) -> String {
    self.clone().into_string()
  }
}

/// Evaluates snippet source and returns its textual result.
pub fn eval_snippet(code: &str) -> Result<String, String> {
  let (value, rest) = parse_expr(code)?;
  let rest = rest.trim();
  if !rest.is_empty() {
    return Err(format!("unexpected trailing input {rest:?}"));
  }
  Ok(value.into_string())
}

fn parse_expr(s: &str) -> Result<(SnippetValue, &str), String> {
  let (mut acc, mut rest) = parse_term(s)?;
  loop {
    let trimmed = rest.trim_start();
    let Some(after) = trimmed.strip_prefix('+') else {
      return Ok((acc, rest));
    };
    let (rhs, after) = parse_term(after)?;
    acc = match (acc, rhs) {
      (SnippetValue::Int(a), SnippetValue::Int(b)) => {
        SnippetValue::Int(a.checked_add(b).ok_or("integer overflow")?)
      }
      (a, b) => SnippetValue::Str(bounded(a.into_string() + &b.into_string())?),
    };
    rest = after;
  }
}

fn parse_term(s: &str) -> Result<(SnippetValue, &str), String> {
  let s = s.trim_start();
  let first = s.chars().next().ok_or("unexpected end of snippet")?;
  match first {
    '"' | '\'' => parse_string(s, first),
    '(' => {
      let (value, rest) = parse_expr(&s[1..])?;
      let rest = rest
        .trim_start()
        .strip_prefix(')')
        .ok_or("expected ')'")?;
      Ok((value, rest))
    }
    c if c.is_ascii_digit() || c == '-' => parse_integer(s),
    c if c.is_ascii_alphabetic() || c == '_' => parse_call(s),
    c => Err(format!("unexpected character {c:?}")),
  }
}

/// Parses a quoted string literal (`\n`, `\t`, `\\` and escaped quotes supported).
fn parse_string(s: &str, quote: char) -> Result<(SnippetValue, &str), String> {
  let mut out = String::new();
  let mut chars = s[1..].char_indices();
  while let Some((i, c)) = chars.next() {
    match c {
      '\\' => match chars.next() {
        Some((_, 'n')) => out.push('\n'),
        Some((_, 't')) => out.push('\t'),
        Some((_, other)) => out.push(other),
        None => break,
      },
      c if c == quote => return Ok((SnippetValue::Str(out), &s[1 + i + 1..])),
      c => out.push(c),
    }
  }
  Err("unterminated string literal".to_string())
}

fn parse_integer(s: &str) -> Result<(SnippetValue, &str), String> {
  let digits_start = usize::from(s.starts_with('-'));
  let end = s[digits_start..]
    .find(|c: char| !c.is_ascii_digit())
    .map(|i| i + digits_start)
    .unwrap_or(s.len());
  let value = s[..end]
    .parse::<i64>()
    .map_err(|_| format!("invalid integer {:?}", &s[..end]))?;
  Ok((SnippetValue::Int(value), &s[end..]))
}

fn parse_call(s: &str) -> Result<(SnippetValue, &str), String> {
  let end = s
    .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
    .unwrap_or(s.len());
  let name = &s[..end];
  let mut rest = s[end..]
    .trim_start()
    .strip_prefix('(')
    .ok_or_else(|| format!("unknown name {name:?}"))?;
  let mut args = Vec::new();
  if let Some(after) = rest.trim_start().strip_prefix(')') {
    return Ok((call_function(name, args)?, after));
  }
  loop {
    let (arg, after) = parse_expr(rest)?;
    args.push(arg);
    let after = after.trim_start();
    if let Some(after) = after.strip_prefix(',') {
      rest = after;
    } else if let Some(after) = after.strip_prefix(')') {
      return Ok((call_function(name, args)?, after));
    } else {
      return Err(format!("expected ',' or ')' in call to {name}"));
    }
  }
}

fn call_function(name: &str, args: Vec<SnippetValue>) -> Result<SnippetValue, String> {
  let arity = |n: usize| -> Result<(), String> {
    if args.len() == n {
      Ok(())
    } else {
      Err(format!("{name} takes {n} argument(s), got {}", args.len()))
    }
  };
  match name {
    "len" | "length" => {
      arity(1)?;
      Ok(SnippetValue::Int(args[0].as_string().chars().count() as i64))
    }
    "upper" => {
      arity(1)?;
      Ok(SnippetValue::Str(args[0].as_string().to_uppercase()))
    }
    "lower" => {
      arity(1)?;
      Ok(SnippetValue::Str(args[0].as_string().to_lowercase()))
    }
    "trim" => {
      arity(1)?;
      Ok(SnippetValue::Str(args[0].as_string().trim().to_string()))
    }
    "ascii" => {
      arity(1)?;
      Ok(SnippetValue::Str(ascii_escape(&args[0].as_string())))
    }
    "str" => {
      arity(1)?;
      Ok(SnippetValue::Str(args[0].as_string()))
    }
    "int" => {
      arity(1)?;
      let s = args[0].as_string();
      s.trim()
        .parse::<i64>()
        .map(SnippetValue::Int)
        .map_err(|_| format!("int: {s:?} is not an integer"))
    }
    "repeat" => {
      arity(2)?;
      let count = match args[1] {
        SnippetValue::Int(n) if n >= 0 => n as usize,
        _ => return Err("repeat: count must be a non-negative integer".to_string()),
      };
      let s = args[0].as_string();
      if s.len().saturating_mul(count) > MAX_OUTPUT_LEN {
        return Err("repeat: result too large".to_string());
      }
      Ok(SnippetValue::Str(s.repeat(count)))
    }
    "replace" => {
      arity(3)?;
      let s = args[0].as_string();
      let from = args[1].as_string();
      if from.is_empty() {
        return Err("replace: pattern must not be empty".to_string());
      }
      Ok(SnippetValue::Str(bounded(s.replace(&from, &args[2].as_string()))?))
    }
    "reverse" => {
      arity(1)?;
      Ok(SnippetValue::Str(args[0].as_string().chars().rev().collect()))
    }
    _ => Err(format!("unknown function {name:?}")),
  }
}

fn bounded(s: String) -> Result<String, String> {
  if s.len() > MAX_OUTPUT_LEN {
    Err("snippet result too large".to_string())
  } else {
    Ok(s)
  }
}

/// Escapes every non-ASCII character as `\xNN`, `\uNNNN` or `\UNNNNNNNN`.
pub(crate) fn ascii_escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    let code = c as u32;
    if c.is_ascii() {
      out.push(c);
    } else if code < 0x100 {
      out.push_str(&format!("\\x{code:02x}"));
    } else if code < 0x10000 {
      out.push_str(&format!("\\u{code:04x}"));
    } else {
      out.push_str(&format!("\\U{code:08x}"));
    }
  }
  out
}
