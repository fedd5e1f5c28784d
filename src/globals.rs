//! Global variable namespace used by `$NAME` substitutions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{GraphError, GraphResult};

/// Flat key/value store for globals.
///
/// Keys are at least two characters: an uppercase ASCII letter followed by uppercase ASCII
/// letters, digits or underscores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStore {
  values: BTreeMap<String, String>,
}

impl GlobalStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
      return false;
    };
    key.len() >= 2
      && first.is_ascii_uppercase()
      && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
  }

  #[instrument(level = "trace", skip(self, value))]
  pub fn set(&mut self, key: &str, value: impl Into<String>) -> GraphResult<()> {
    if !Self::is_valid_key(key) {
      return Err(GraphError::InvalidGlobalKey(key.to_string()));
    }
    let value = value.into();
    debug!(key, value = %value, "global set");
    self.values.insert(key.to_string(), value);
    Ok(())
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.values.get(key).map(String::as_str)
  }

  pub fn remove(&mut self, key: &str) -> Option<String> {
    self.values.remove(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.values.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn clear(&mut self) {
    self.values.clear();
  }
}
