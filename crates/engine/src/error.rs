// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow Runner error taxonomy (spec §4.F, §7 `WorkflowLimitError`).

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("task is {len} chars, exceeds limit of {max}")]
    TaskTooLong { len: usize, max: usize },

    #[error("workflow has {len} steps, exceeds limit of {max}")]
    TooManySteps { len: usize, max: usize },

    #[error("required skill {skill:?} is not known to this orchestrator")]
    SkillUnknown { skill: String },

    #[error("required skill {skill:?} is denied by the permission map")]
    SkillDenied { skill: String },

    #[error("worker {worker_id} is not available and autoSpawn is disabled")]
    WorkerUnavailable { worker_id: String },

    #[error("no workflow definition for step's worker {worker_id}")]
    UnknownWorkerProfile { worker_id: String },

    #[error("no paused run with id {run_id}")]
    UnknownRun { run_id: String },

    #[error("workflow {workflow_id} referenced by a paused run no longer exists")]
    UnknownWorkflow { workflow_id: String },

    #[error("worker backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
