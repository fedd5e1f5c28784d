//! UI-only node fields. The engine stores them and never reads them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
  pub position: (f64, f64),
  pub color: Option<String>,
  pub selected: bool,
}
