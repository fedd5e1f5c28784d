//! CLI: Load a textweave graph from a .dot file and cook it.
//!
//! Usage: `cook_dot [OPTIONS] <path-to-dot-file> [NODE]...`
//! Example: cook_dot --set COUNT=5 pipelines/summarize.dot joined
//!
//! Without NODE arguments every top-level node with no outgoing connection is cooked.
//! Each cooked node's output items are printed one per line, followed by its errors and
//! warnings. Exits with status 1 when any cooked node has errors.
//!
//! Set RUST_LOG=textweave=trace for TRACE-level span enter/exit and events.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use textweave::{EngineConfig, NodeId, Workspace, load_dot};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Load a .dot graph and cook its output nodes.
#[derive(Parser, Debug)]
#[command(name = "cook_dot")]
#[command(
  after_help = r#"Environment variables (override --agent-cmd and --stage-dir when set):
  TEXTWEAVE_AGENT_CMD        Command for query nodes (e.g. cursor-agent). The prompt is sent on
                             stdin; stdout is the response.
  TEXTWEAVE_STAGE_DIR        Working directory handed to the agent (default: .textweave).
  TEXTWEAVE_MAX_ITERATIONS   Iteration cap for a single looper cook.
  TEXTWEAVE_HASH_SIZE_LIMIT  Bytes of input hashed by the dirty check.

Examples:
  cook_dot pipelines/summarize.dot
  cook_dot --set COUNT=3 --force pipelines/summarize.dot loop1"#
)]
struct Args {
  /// Command for query nodes. Overridden by TEXTWEAVE_AGENT_CMD if set.
  #[arg(long, value_name = "CMD")]
  agent_cmd: Option<String>,

  /// Working directory for query agents. Overridden by TEXTWEAVE_STAGE_DIR if set.
  #[arg(long, value_name = "DIR")]
  stage_dir: Option<PathBuf>,

  /// Set a global before cooking (repeatable), e.g. --set COUNT=3
  #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_global)]
  globals: Vec<(String, String)>,

  /// Recook the target nodes even when their cache is clean
  #[arg(long)]
  force: bool,

  /// Path to the .dot graph file
  #[arg(value_name = "path-to-dot-file")]
  dot_path: PathBuf,

  /// Nodes to cook, by path or name. Default: every unconnected top-level output.
  #[arg(value_name = "NODE")]
  nodes: Vec<String>,
}

fn parse_global(raw: &str) -> Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(k, v)| (k.trim().to_string(), v.to_string()))
    .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  // Flags first, then env vars on top.
  let mut config = EngineConfig::default();
  if let Some(cmd) = &args.agent_cmd {
    config.agent_cmd = Some(cmd.clone());
  }
  if let Some(dir) = &args.stage_dir {
    config.stage_dir = dir.clone();
  }
  let config = config.with_env_overrides();
  info!(
    agent_cmd = ?config.agent_cmd,
    stage_dir = %config.stage_dir.display(),
    "options (env or flags)"
  );

  let path = &args.dot_path;
  let dot = match fs::read_to_string(path) {
    Ok(s) => s,
    Err(e) => {
      eprintln!("Error reading {}: {}", path.display(), e);
      process::exit(1);
    }
  };

  let mut ws = Workspace::with_config(config);
  let report = match load_dot(&mut ws, &dot) {
    Ok(r) => r,
    Err(e) => {
      eprintln!("Error loading graph: {}", e);
      process::exit(1);
    }
  };
  for warning in &report.warnings {
    eprintln!("warning: {warning}");
  }
  for (key, value) in &args.globals {
    if let Err(e) = ws.globals_mut().set(key, value.clone()) {
      eprintln!("Error: {}", e);
      process::exit(1);
    }
  }

  let targets: Vec<NodeId> = if args.nodes.is_empty() {
    match ws.cook_all(args.force) {
      Ok(ids) => ids,
      Err(e) => {
        eprintln!("Cook error: {}", e);
        process::exit(1);
      }
    }
  } else {
    let mut ids = Vec::new();
    for name in &args.nodes {
      let Some(id) = ws.node_from_name(name) else {
        eprintln!("Error: no node named {name}");
        process::exit(1);
      };
      if let Err(e) = ws.cook(id, args.force) {
        eprintln!("Cook error: {}", e);
        process::exit(1);
      }
      ids.push(id);
    }
    ids
  };

  let mut failed = false;
  for id in targets {
    let Some(node) = ws.node(id) else {
      continue;
    };
    println!("{}:", node.path());
    for item in node.cached_output() {
      println!("  {item}");
    }
    for error in node.errors() {
      println!("  error: {error}");
      failed = true;
    }
    for warning in node.warnings() {
      println!("  warning: {warning}");
    }
  }
  info!(failed, "cook finished");
  if failed {
    process::exit(1);
  }
}
