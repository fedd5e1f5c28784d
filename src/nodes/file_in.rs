//! FileIn node: reads a text file into items.

use std::any::Any;
use std::fs;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::error::GraphResult;
use crate::node::NodeBehavior;
use crate::types::{NodeId, Output, Parm};
use crate::workspace::{CookContext, HashContext, Workspace};

/// Reads `file_path` and splits it into trimmed items.
///
/// A file holding a JSON array of strings yields one item per element; anything else is
/// split on `delimiter`. The dirty check covers the file's size and modification time, so
/// an unchanged file is not read again.
#[derive(Debug, Clone, Default)]
pub struct FileIn {
  reads: u64,
}

impl FileIn {
  /// Number of times the file was read.
  pub fn reads(&self) -> u64 {
    self.reads
  }
}

fn reload(ws: &mut Workspace, id: NodeId) -> GraphResult<()> {
  ws.cook(id, true)
}

/// Items of a file's content.
pub(crate) fn parse_items(content: &str, delimiter: &str) -> Output {
  if content.trim_start().starts_with('[') {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(content) {
      return items;
    }
  }
  let pieces: Vec<&str> = if delimiter.is_empty() {
    vec![content]
  } else {
    content.split(delimiter).collect()
  };
  pieces
    .into_iter()
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .map(str::to_string)
    .collect()
}

impl NodeBehavior for FileIn {
  fn input_labels(&self) -> Vec<String> {
    Vec::new()
  }

  fn parm_templates(&self) -> Vec<Parm> {
    vec![
      Parm::string("file_path", ""),
      Parm::string("delimiter", ","),
      Parm::button("reload", reload),
    ]
  }

  #[instrument(level = "trace", skip(self, ctx))]
  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    let path = ctx.parm_str("file_path")?;
    if path.trim().is_empty() {
      return Err("file_path is empty".to_string());
    }
    let delimiter = ctx.parm_str("delimiter")?;
    let content = fs::read_to_string(&path).map_err(|e| format!("read {path}: {e}"))?;
    self.reads += 1;
    debug!(path = %path, bytes = content.len(), reads = self.reads, "file read");
    Ok(parse_items(&content, &delimiter))
  }

  fn extend_hash(&self, ctx: &HashContext<'_>, hasher: &mut Sha256) {
    let Some(path) = ctx.parm_str("file_path") else {
      return;
    };
    match fs::metadata(&path) {
      Ok(meta) => {
        hasher.update(meta.len().to_le_bytes());
        let modified = meta
          .modified()
          .ok()
          .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
          .map(|d| d.as_nanos())
          .unwrap_or_default();
        hasher.update(modified.to_le_bytes());
      }
      Err(_) => hasher.update(b"missing"),
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
