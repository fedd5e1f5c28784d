//! Looper: the composite node that runs its body once per iteration.
//!
//! A looper owns two permanent children, `<looper>/input` ([InputRelay]) and
//! `<looper>/output` ([OutputRelay]). Each iteration publishes the iteration value to the
//! loop manager, feeds the input relay, cooks the body behind the output relay and appends
//! the output relay's slice to its accumulator. The accumulator is the looper's output.

use std::any::Any;

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use super::relay::{InputRelay, OutputRelay};
use crate::error::GraphError;
use crate::node::{Composite, NodeBehavior};
use crate::types::{NodeId, NodeType, Output, Parm};
use crate::workspace::{CookContext, HashContext, Workspace, join_path};

pub const INPUT_RELAY: &str = "input";
pub const OUTPUT_RELAY: &str = "output";

const CHILDREN: &[(&str, NodeType)] = &[
  (INPUT_RELAY, NodeType::InputRelay),
  (OUTPUT_RELAY, NodeType::OutputRelay),
];

#[derive(Debug, Clone, Default)]
pub struct Looper {
  runs: u64,
}

impl Looper {
  /// Number of completed loop runs.
  pub fn runs(&self) -> u64 {
    self.runs
  }
}

/// Settings of one loop run, evaluated once at its start.
#[derive(Debug, Clone)]
struct Plan {
  values: Vec<i64>,
  per_item: bool,
  feedback: bool,
  force_body: bool,
}

/// `min, min+step, ...` up to `max`, with at most `cap + 1` values so callers can detect
/// truncation.
pub(crate) fn range_values(min: i64, max: i64, step: i64, cap: usize) -> Vec<i64> {
  let mut values = Vec::new();
  let mut current = Some(min);
  while let Some(v) = current.filter(|v| *v <= max) {
    if values.len() > cap {
      break;
    }
    values.push(v);
    current = v.checked_add(step);
  }
  values
}

fn plan(ctx: &mut CookContext<'_>, external: &Output) -> Result<Plan, String> {
  let per_item = ctx.parm_bool("max_from_input")?;
  let feedback = ctx.parm_bool("feedback_mode")?;
  let force_body = ctx.parm_bool("cook_loops")?;
  let cap = ctx.config().max_iterations;

  let mut values = if per_item {
    (1..=external.len().min(cap + 1) as i64).collect()
  } else {
    let min = ctx.parm_int("min")?;
    let max = ctx.parm_int("max")?;
    let step = if ctx.parm_bool("step_from_input")? {
      let first = external
        .first()
        .ok_or_else(|| "step_from_input: no input items".to_string())?;
      first
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("step_from_input: {first:?} is not an integer"))?
    } else {
      ctx.parm_int("step")?
    };
    if step <= 0 {
      return Err(format!("step must be positive, got {step}"));
    }
    range_values(min, max, step, cap)
  };
  if values.len() > cap {
    values.truncate(cap);
    ctx.warn(format!("iteration count capped at {cap}"));
  }
  Ok(Plan {
    values,
    per_item,
    feedback,
    force_body,
  })
}

fn relay_ids(ws: &Workspace, path: &str) -> Result<(NodeId, NodeId), GraphError> {
  Ok((
    ws.id_of(&join_path(path, INPUT_RELAY))?,
    ws.id_of(&join_path(path, OUTPUT_RELAY))?,
  ))
}

/// Runs every iteration. Returns the ordinals of failed iterations.
fn run_iterations(
  ws: &mut Workspace,
  path: &str,
  plan: &Plan,
  external: &Output,
) -> Result<Vec<usize>, GraphError> {
  let (input_relay, output_relay) = relay_ids(ws, path)?;
  if let Some(relay) = ws.behavior_mut::<OutputRelay>(output_relay) {
    relay.reset();
  }
  let mut failed = Vec::new();
  for (i, value) in plan.values.iter().enumerate() {
    let ordinal = i + 1;
    ws.loops_mut().set_loop(path, *value);

    let feed = if plan.feedback && ordinal > 1 {
      ws.behavior::<OutputRelay>(output_relay)
        .map(|r| r.accumulated().clone())
        .unwrap_or_default()
    } else if plan.per_item {
      external.get(i).cloned().into_iter().collect()
    } else {
      external.clone()
    };
    if let Some(relay) = ws.behavior_mut::<InputRelay>(input_relay) {
      relay.set_feed(feed);
    }
    ws.invalidate(input_relay)?;

    if plan.force_body {
      ws.force_cook_upstream(output_relay, path)?;
    } else {
      ws.cook(output_relay, false)?;
    }

    let relay = ws.node_ref(output_relay)?;
    if !relay.state().is_valid() || !relay.errors().is_empty() {
      debug!(path, ordinal, "iteration failed");
      failed.push(ordinal);
      continue;
    }
    let slice = relay.cached_output().clone();
    if let Some(relay) = ws.behavior_mut::<OutputRelay>(output_relay) {
      relay.extend(slice);
    }
  }
  Ok(failed)
}

impl Composite for Looper {
  fn permanent_children(&self) -> &'static [(&'static str, NodeType)] {
    CHILDREN
  }
}

impl NodeBehavior for Looper {
  fn parm_templates(&self) -> Vec<Parm> {
    vec![
      Parm::int("min", 1),
      Parm::int("max", 1),
      Parm::int("step", 1),
      Parm::toggle("max_from_input", false),
      Parm::toggle("step_from_input", false),
      Parm::toggle("feedback_mode", false),
      Parm::toggle("cook_loops", false),
    ]
  }

  #[instrument(level = "trace", skip(self, ctx))]
  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    let path = ctx.path();
    let external = ctx.input(0);
    let plan = plan(ctx, &external)?;
    info!(path = %path, iterations = plan.values.len(), "loop start");

    let ws = ctx.workspace();
    ws.loops_mut().start_loop(&path);
    let result = run_iterations(ws, &path, &plan, &external);
    ws.loops_mut().clean_stale(&path);
    let failed = result.map_err(|e| e.to_string())?;

    for ordinal in &failed {
      ctx.warn(format!("iteration {ordinal} failed"));
    }
    if !failed.is_empty() {
      warn!(path = %path, failed = failed.len(), "loop finished with failed iterations");
    }
    self.runs += 1;
    let (_, output_relay) = relay_ids(ctx.workspace_ref(), &path).map_err(|e| e.to_string())?;
    Ok(
      ctx
        .workspace_ref()
        .behavior::<OutputRelay>(output_relay)
        .map(|r| r.accumulated().clone())
        .unwrap_or_default(),
    )
  }

  /// Loopers nested in another loop re-run on every outer iteration, and any global can
  /// reach the body, so both feed the digest along with the body's outside state.
  fn extend_hash(&self, ctx: &HashContext<'_>, hasher: &mut Sha256) {
    hasher.update(format!("{:?}", ctx.scope).as_bytes());
    for (key, value) in ctx.ws.globals().iter() {
      hasher.update(key.as_bytes());
      hasher.update(value.as_bytes());
    }
    ctx.ws.hash_body(ctx.node.session_id(), hasher);
  }

  fn as_composite(&self) -> Option<&dyn Composite> {
    Some(self)
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
