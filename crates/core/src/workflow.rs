// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow run state (spec §3 `WorkflowRunState`, §4.F).

use crate::ids::{JobId, RunId, SessionId, WorkerProfileId, WorkflowId};
use serde::{Deserialize, Serialize};

/// Closed set of workflow run states (spec §3, §4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Paused,
    Success,
    Error,
}

crate::simple_display! {
    WorkflowStatus {
        Running => "running",
        Paused => "paused",
        Success => "success",
        Error => "error",
    }
}

impl WorkflowStatus {
    /// Paused runs are persisted on disk; success/error runs are
    /// deleted from the pause store (spec §3 invariant).
    pub fn is_persisted(self) -> bool {
        matches!(self, WorkflowStatus::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStatus::Success | WorkflowStatus::Error)
    }
}

/// Outcome of a single executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

crate::simple_display! {
    StepStatus {
        Success => "success",
        Error => "error",
    }
}

/// Result of one executed workflow step (spec §3 `WorkflowStepResult`).
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStepResult {
    pub id: String,
    pub title: String,
    pub worker_id: WorkerProfileId,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub started_at: u64,
    pub finished_at: u64,
    pub duration_ms: u64,
}

/// Execution gating mode (spec §4.F gating table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionGate {
    /// Pause after every step, success or error.
    Step,
    /// Gated by `InterveneGate` instead.
    Auto,
}

/// When to pause under `execution = auto` (spec §4.F gating table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterveneGate {
    Always,
    OnWarning,
    OnError,
    Never,
}

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkflowUi {
    pub execution: ExecutionGate,
    pub intervene: InterveneGate,
}

/// Security limits enforced by the runner before and during execution
/// (spec §4.F, §8 boundary behavior).
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkflowLimits {
    pub max_steps: usize,
    pub max_task_chars: usize,
    pub max_carry_chars: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_step_timeout_ms: Option<u64>,
}

impl Default for WorkflowLimits {
    fn default() -> Self {
        Self {
            max_steps: 20,
            max_task_chars: 20_000,
            max_carry_chars: 20_000,
            per_step_timeout_ms: None,
        }
    }
}

/// Live + persisted state of one workflow run (spec §3).
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunState {
    pub run_id: RunId,
    pub workflow_id: WorkflowId,
    pub workflow_name: String,
    pub task: String,
    #[serde(default)]
    pub carry: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<serde_json::Value>,
    pub auto_spawn: bool,
    pub limits: WorkflowLimits,
    pub ui: WorkflowUi,
    pub status: WorkflowStatus,
    pub current_step_index: usize,
    #[serde(default)]
    pub steps: Vec<WorkflowStepResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_step_result: Option<WorkflowStepResult>,
    pub started_at: u64,
    pub updated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<SessionId>,
}

impl WorkflowRunState {
    /// Truncate `carry` to `limits.max_carry_chars`, appending a marker
    /// (spec §4.F step 5).
    pub fn set_carry(&mut self, response: String) {
        if response.chars().count() <= self.limits.max_carry_chars {
            self.carry = Some(response);
            return;
        }
        let truncated: String = response.chars().take(self.limits.max_carry_chars).collect();
        self.carry = Some(format!("{truncated}\n…(truncated)"));
    }

    pub fn push_step(&mut self, result: WorkflowStepResult, updated_at: u64) {
        self.last_step_result = Some(result.clone());
        self.steps.push(result);
        self.updated_at = updated_at;
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
