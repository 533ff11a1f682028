// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step prompt composition (spec §4.F: each step's `prompt` template is
//! rendered with `{task}` and `{carry}` before being sent to the
//! worker). No teacher analog — grounded directly on the spec's step
//! shape and on `orc_core::workflow::WorkflowRunState::steps` as the
//! source of prior-step history.
//!
//! Open Question (recorded in DESIGN.md): the spec names the `{task}`/
//! `{carry}` substitution but does not mandate a rendering for prior
//! steps beyond `carry`. Decision: prepend a `"## Step N: <title>"`
//! heading block per completed step ahead of the substituted template,
//! so a worker resuming a multi-step run sees what ran before it even
//! when `carry` is false for the current step.

use orc_core::workflow::WorkflowStepResult;

/// Render one step's prompt template against the run's current task,
/// carry string, and prior step history.
pub fn compose_step_prompt(template: &str, task: &str, carry: Option<&str>, history: &[WorkflowStepResult]) -> String {
    let rendered = template.replace("{task}", task).replace("{carry}", carry.unwrap_or(""));
    if history.is_empty() {
        return rendered;
    }
    let mut out = String::new();
    for (i, step) in history.iter().enumerate() {
        out.push_str(&format!("## Step {}: {}\n", i + 1, step.title));
        if let Some(response) = &step.response {
            out.push_str(response);
            out.push('\n');
        } else if let Some(error) = &step.error {
            out.push_str("(failed: ");
            out.push_str(error);
            out.push_str(")\n");
        }
        out.push('\n');
    }
    out.push_str(&rendered);
    out
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
