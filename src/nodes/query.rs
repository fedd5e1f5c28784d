//! Query node: sends prompts to an external agent command.

use std::any::Any;

use tracing::info;

use crate::agent_run::run_agent;
use crate::node::NodeBehavior;
use crate::types::{Output, Parm};
use crate::workspace::CookContext;

/// Runs the agent once per prompt and emits one response per prompt.
///
/// Without `per_item` the single prompt is the evaluated `prompt` parm followed by the input
/// items, one per line. With `per_item` every input item is its own prompt.
#[derive(Debug, Clone, Default)]
pub struct Query {
  calls: u64,
}

impl Query {
  pub fn calls(&self) -> u64 {
    self.calls
  }
}

impl NodeBehavior for Query {
  fn parm_templates(&self) -> Vec<Parm> {
    vec![
      Parm::string("prompt", ""),
      Parm::string("agent_cmd", ""),
      Parm::toggle("per_item", false),
    ]
  }

  fn cook(&mut self, ctx: &mut CookContext<'_>) -> Result<Output, String> {
    let own_cmd = ctx.parm_str("agent_cmd")?;
    let agent_cmd = if own_cmd.trim().is_empty() {
      ctx
        .config()
        .agent_cmd
        .clone()
        .ok_or_else(|| "no agent command configured".to_string())?
    } else {
      own_cmd
    };
    let prompt = ctx.parm_str("prompt")?;
    let items = ctx.input(0);
    let prompts = if ctx.parm_bool("per_item")? {
      items
        .into_iter()
        .map(|item| {
          if prompt.is_empty() {
            item
          } else {
            format!("{prompt}\n{item}")
          }
        })
        .collect()
    } else {
      let lines: Vec<String> = std::iter::once(prompt)
        .chain(items)
        .filter(|l| !l.is_empty())
        .collect();
      if lines.is_empty() {
        Vec::new()
      } else {
        vec![lines.join("\n")]
      }
    };

    let stage_dir = ctx.config().stage_dir.clone();
    let path = ctx.path();
    let mut responses = Vec::with_capacity(prompts.len());
    for prompt in &prompts {
      info!(node = %path, command = %agent_cmd, "running");
      self.calls += 1;
      responses.push(run_agent(&agent_cmd, prompt, &stage_dir)?);
    }
    Ok(responses)
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}
