//! Typed node parameters.
//!
//! A parm stores its raw value. STRING and STRINGLIST values (and INT values given as
//! expression strings) go through the expression evaluator on every [Parm::eval]; only the
//! parsed templates are cached.

use std::fmt;

use once_cell::unsync::OnceCell;
use serde_json::Value;

use crate::error::GraphResult;
use crate::expression::{EvalContext, Evaluated, Template, parse_template};
use crate::types::NodeId;
use crate::workspace::Workspace;

/// Callback run when a BUTTON parm is pressed.
pub type ButtonCallback = fn(&mut Workspace, NodeId) -> GraphResult<()>;

/// Declared type of a parm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParmType {
  String,
  Int,
  Toggle,
  Menu,
  Button,
  StringList,
}

impl fmt::Display for ParmType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParmType::String => write!(f, "STRING"),
      ParmType::Int => write!(f, "INT"),
      ParmType::Toggle => write!(f, "TOGGLE"),
      ParmType::Menu => write!(f, "MENU"),
      ParmType::Button => write!(f, "BUTTON"),
      ParmType::StringList => write!(f, "STRINGLIST"),
    }
  }
}

/// Raw or evaluated parm value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParmValue {
  Str(String),
  Int(i64),
  Toggle(bool),
  StringList(Vec<String>),
  /// BUTTON parms carry no value.
  Empty,
}

impl ParmValue {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      ParmValue::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      ParmValue::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      ParmValue::Toggle(b) => Some(*b),
      _ => None,
    }
  }

  pub fn to_json(&self) -> Value {
    match self {
      ParmValue::Str(s) => Value::String(s.clone()),
      ParmValue::Int(i) => Value::from(*i),
      ParmValue::Toggle(b) => Value::Bool(*b),
      ParmValue::StringList(items) => Value::from(items.clone()),
      ParmValue::Empty => Value::Null,
    }
  }

  /// Converts a JSON value into a value suitable for a parm of type `ty`.
  pub fn from_json(ty: ParmType, value: &Value) -> Result<ParmValue, String> {
    match (ty, value) {
      (ParmType::String | ParmType::Menu, Value::String(s)) => Ok(ParmValue::Str(s.clone())),
      (ParmType::String | ParmType::Menu, Value::Number(n)) => Ok(ParmValue::Str(n.to_string())),
      (ParmType::Int, Value::Number(n)) => n
        .as_i64()
        .map(ParmValue::Int)
        .ok_or_else(|| format!("expected an integer, got {n}")),
      (ParmType::Int, Value::String(s)) => Ok(
        s.trim()
          .parse()
          .map(ParmValue::Int)
          .unwrap_or_else(|_| ParmValue::Str(s.clone())),
      ),
      (ParmType::Toggle, Value::Bool(b)) => Ok(ParmValue::Toggle(*b)),
      (ParmType::Toggle, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(ParmValue::Toggle(true)),
        "false" | "0" | "off" => Ok(ParmValue::Toggle(false)),
        _ => Err(format!("expected a boolean, got {s:?}")),
      },
      (ParmType::Toggle, Value::Number(n)) => Ok(ParmValue::Toggle(n.as_i64() != Some(0))),
      (ParmType::StringList, Value::Array(items)) => items
        .iter()
        .map(|v| match v {
          Value::String(s) => Ok(s.clone()),
          other => Err(format!("expected a string item, got {other}")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ParmValue::StringList),
      (ParmType::StringList, Value::String(s)) => Ok(ParmValue::StringList(vec![s.clone()])),
      (ParmType::Button, _) => Err("button parms have no value".to_string()),
      (ty, other) => Err(format!("{ty} parm cannot hold {other}")),
    }
  }
}

impl From<&str> for ParmValue {
  fn from(s: &str) -> Self {
    ParmValue::Str(s.to_string())
  }
}

impl From<String> for ParmValue {
  fn from(s: String) -> Self {
    ParmValue::Str(s)
  }
}

impl From<i64> for ParmValue {
  fn from(i: i64) -> Self {
    ParmValue::Int(i)
  }
}

impl From<i32> for ParmValue {
  fn from(i: i32) -> Self {
    ParmValue::Int(i64::from(i))
  }
}

impl From<bool> for ParmValue {
  fn from(b: bool) -> Self {
    ParmValue::Toggle(b)
  }
}

impl From<Vec<String>> for ParmValue {
  fn from(items: Vec<String>) -> Self {
    ParmValue::StringList(items)
  }
}

/// A named, typed, independently evaluable node configuration value.
#[derive(Debug, Clone)]
pub struct Parm {
  name: String,
  parm_type: ParmType,
  raw: ParmValue,
  default: ParmValue,
  is_default: bool,
  menu_items: Vec<String>,
  callback: Option<ButtonCallback>,
  templates: OnceCell<Vec<Template>>,
}

impl Parm {
  fn new(name: &str, parm_type: ParmType, default: ParmValue) -> Self {
    Self {
      name: name.to_string(),
      parm_type,
      raw: default.clone(),
      default,
      is_default: true,
      menu_items: Vec::new(),
      callback: None,
      templates: OnceCell::new(),
    }
  }

  pub fn string(name: &str, default: &str) -> Self {
    Self::new(name, ParmType::String, ParmValue::Str(default.to_string()))
  }

  pub fn int(name: &str, default: i64) -> Self {
    Self::new(name, ParmType::Int, ParmValue::Int(default))
  }

  pub fn toggle(name: &str, default: bool) -> Self {
    Self::new(name, ParmType::Toggle, ParmValue::Toggle(default))
  }

  pub fn menu(name: &str, items: &[&str], default: &str) -> Self {
    let mut parm = Self::new(name, ParmType::Menu, ParmValue::Str(default.to_string()));
    parm.menu_items = items.iter().map(|s| s.to_string()).collect();
    parm
  }

  pub fn button(name: &str, callback: ButtonCallback) -> Self {
    let mut parm = Self::new(name, ParmType::Button, ParmValue::Empty);
    parm.callback = Some(callback);
    parm
  }

  pub fn string_list(name: &str, default: &[&str]) -> Self {
    Self::new(
      name,
      ParmType::StringList,
      ParmValue::StringList(default.iter().map(|s| s.to_string()).collect()),
    )
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn parm_type(&self) -> ParmType {
    self.parm_type
  }

  pub fn raw(&self) -> &ParmValue {
    &self.raw
  }

  pub fn default_value(&self) -> &ParmValue {
    &self.default
  }

  pub fn is_default(&self) -> bool {
    self.is_default
  }

  pub fn menu_items(&self) -> &[String] {
    &self.menu_items
  }

  pub fn callback(&self) -> Option<ButtonCallback> {
    self.callback
  }

  /// Replaces the raw value after checking it against the declared type.
  pub fn set(&mut self, value: ParmValue) -> Result<(), String> {
    let accepted = match (self.parm_type, &value) {
      (ParmType::String, ParmValue::Str(_)) => true,
      (ParmType::Int, ParmValue::Int(_) | ParmValue::Str(_)) => true,
      (ParmType::Toggle, ParmValue::Toggle(_)) => true,
      (ParmType::StringList, ParmValue::StringList(_)) => true,
      (ParmType::Menu, ParmValue::Str(s)) => {
        if !self.menu_items.iter().any(|item| item == s) {
          return Err(format!(
            "{s:?} is not one of {:?}",
            self.menu_items
          ));
        }
        true
      }
      _ => false,
    };
    if !accepted {
      return Err(format!("{} parm cannot hold {:?}", self.parm_type, value));
    }
    self.is_default = value == self.default;
    self.raw = value;
    self.templates = OnceCell::new();
    Ok(())
  }

  pub fn reset_to_default(&mut self) {
    self.raw = self.default.clone();
    self.is_default = true;
    self.templates = OnceCell::new();
  }

  /// Parsed templates of the raw value, one per string. Parsed once per raw value.
  pub fn templates(&self) -> &[Template] {
    self.templates.get_or_init(|| match &self.raw {
      ParmValue::Str(s) if self.parm_type != ParmType::Menu => vec![parse_template(s)],
      ParmValue::StringList(items) => items.iter().map(|s| parse_template(s)).collect(),
      _ => Vec::new(),
    })
  }

  /// Evaluates the parm against the ambient context. Never cached.
  pub fn eval(&self, ctx: &EvalContext<'_>) -> Evaluated<ParmValue> {
    let mut diagnostics = Vec::new();
    let value = match (&self.raw, self.parm_type) {
      (ParmValue::Str(s), ParmType::Menu) => ParmValue::Str(s.clone()),
      (ParmValue::Str(_), ty) => {
        let rendered = self.render_first(ctx, &mut diagnostics);
        if ty == ParmType::Int {
          match rendered.trim().parse::<i64>() {
            Ok(i) => ParmValue::Int(i),
            Err(_) => ParmValue::Str(rendered),
          }
        } else {
          ParmValue::Str(rendered)
        }
      }
      (ParmValue::StringList(_), _) => ParmValue::StringList(
        self
          .templates()
          .iter()
          .map(|t| {
            let ev = t.evaluate(ctx);
            diagnostics.extend(ev.diagnostics);
            ev.value
          })
          .collect(),
      ),
      (other, _) => other.clone(),
    };
    Evaluated { value, diagnostics }
  }

  fn render_first(&self, ctx: &EvalContext<'_>, diagnostics: &mut Vec<String>) -> String {
    match self.templates().first() {
      Some(t) => {
        let ev = t.evaluate(ctx);
        diagnostics.extend(ev.diagnostics);
        ev.value
      }
      None => String::new(),
    }
  }
}
