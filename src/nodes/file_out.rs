//! FileOut node: writes its input to a file and passes it through.

use std::any::Any;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, instrument};

use crate::node::NodeBehavior;
use crate::types::{Output, Parm};
use crate::workspace::CookContext;

#[derive(Debug, Clone, Default)]
pub struct FileOut {
  writes: u64,
}

impl FileOut {
  pub fn writes(&self) -> u64 {
    self.writes
  }
}

impl NodeBehavior for FileOut {
  fn parm_templates(&self) -> Vec<Parm> {
    vec![
      Parm::string("file_path", ""),
      Parm::string("separator", "\n"),
      Parm::toggle("append", false),
    ]
  }

  #[instrument(level = "trace", skip(self, ctx))]
  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    let path = ctx.parm_str("file_path")?;
    if path.trim().is_empty() {
      return Err("file_path is empty".to_string());
    }
    let separator = ctx.parm_str("separator")?;
    let append = ctx.parm_bool("append")?;
    let items = ctx.input(0);

    let target = Path::new(&path);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(|e| format!("create {}: {e}", parent.display()))?;
    }
    let mut content = items.join(&separator);
    let existing = fs::metadata(target).map(|m| m.len()).unwrap_or(0);
    if append && existing > 0 && !content.is_empty() {
      content.insert_str(0, &separator);
    }
    let mut file = OpenOptions::new()
      .create(true)
      .write(true)
      .append(append)
      .truncate(!append)
      .open(target)
      .map_err(|e| format!("open {path}: {e}"))?;
    file
      .write_all(content.as_bytes())
      .map_err(|e| format!("write {path}: {e}"))?;
    self.writes += 1;
    debug!(path = %path, items = items.len(), append, "file written");
    Ok(items)
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
