// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public in-process API request/response shapes (spec §6.1).

use orc_core::workflow::WorkflowUi;
use orc_core::{JobId, RunId, WorkerProfileId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Auto,
    Worker,
    Workflow,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStartRequest {
    #[serde(default)]
    pub kind: Option<TaskKind>,
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_run_id: Option<RunId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<serde_json::Value>,
    #[serde(default)]
    pub auto_spawn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// `continueWorkflow(runId, {uiPolicy?})` (spec §4.F / §6.1): on a
    /// fresh workflow start this replaces the default
    /// `{execution: "auto", intervene: "onError"}`; on a resume
    /// (`continue_run_id` set) it overrides the paused run's stored UI
    /// policy. Ignored for worker-kind tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_policy: Option<WorkflowUi>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStartResponse {
    pub task_id: JobId,
    pub kind: TaskKind,
    pub status: &'static str,
    pub next: &'static str,
}

impl TaskStartResponse {
    pub fn new(task_id: JobId, kind: TaskKind) -> Self {
        Self { task_id, kind, status: "running", next: "task_await" }
    }
}

/// Either a single id or a batch — `task_await`/`task_peek`/`task_cancel`
/// all accept this shape (spec §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskIdSelector {
    One(JobId),
    Many(Vec<JobId>),
}

impl TaskIdSelector {
    pub fn into_vec(self) -> Vec<JobId> {
        match self {
            TaskIdSelector::One(id) => vec![id],
            TaskIdSelector::Many(ids) => ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeekResult {
    Known(orc_core::Job),
    Unknown { id: JobId, status: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskListView {
    Tasks,
    Workers,
    Profiles,
    Models,
    Workflows,
    Status,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskListFormat {
    Markdown,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListRequest {
    #[serde(default)]
    pub view: Option<TaskListView>,
    #[serde(default)]
    pub format: Option<TaskListFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCancelRequest {
    pub ids: TaskIdSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Default for TaskIdSelector {
    fn default() -> Self {
        TaskIdSelector::Many(Vec::new())
    }
}

#[cfg(test)]
#[path = "task_api_tests.rs"]
mod tests;
