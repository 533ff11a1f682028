// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The public in-process API (spec §6.1): `task_start`/`task_await`/
//! `task_peek`/`task_list`/`task_cancel`. This is the surface the host
//! application calls into directly (no MCP/tool-registration layer;
//! spec.md's Non-goals keep this device-local and in-process).

use crate::context::OrchestratorContext;
use crate::error::{ApiError, PoolError};
use crate::pool::SpawnOptions;
use orc_backend::AttachmentInput;
use orc_core::{Clock, Job, JobTarget, RunId, WorkerProfileId};
use orc_wire::{
    PeekResult, TaskCancelRequest, TaskKind, TaskListFormat, TaskListRequest, TaskListView,
    TaskStartRequest, TaskStartResponse,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Thin façade over [`OrchestratorContext`] exposing exactly the five
/// operations spec §6.1 names, each doing wire-shape translation (JSON
/// attachments, id selectors, markdown rendering) at this boundary so
/// the rest of the daemon stays in plain Rust types.
pub struct OrchestratorApi<C: Clock> {
    context: Arc<OrchestratorContext<C>>,
}

impl<C: Clock + 'static> OrchestratorApi<C> {
    pub fn new(context: Arc<OrchestratorContext<C>>) -> Self {
        Self { context }
    }

    /// `task_start`: always returns immediately with a `taskId`; the
    /// actual work runs on a spawned task and lands in the Job Registry.
    pub async fn task_start(&self, req: TaskStartRequest) -> Result<TaskStartResponse, ApiError> {
        match resolve_kind(&req)? {
            TaskKind::Worker => self.start_worker_job(req).await,
            TaskKind::Workflow => self.start_workflow_job(req).await,
            TaskKind::Auto => unreachable!("resolve_kind never returns Auto"),
        }
    }

    async fn start_worker_job(&self, req: TaskStartRequest) -> Result<TaskStartResponse, ApiError> {
        let worker_id = req.worker_id.ok_or(ApiError::UnknownKind)?;
        let profile = self
            .context
            .profiles
            .get(&worker_id)
            .ok_or_else(|| PoolError::UnknownProfile { worker_id: worker_id.to_string() })?;

        let job = self.context.jobs.create(JobTarget::Worker(worker_id), req.task.clone(), None, req.from.clone());
        let job_id = job.id;

        let context = self.context.clone();
        let timeout = req.timeout_ms.map(Duration::from_millis).unwrap_or_else(|| context.config.prompt_timeout());
        let auto_spawn = req.auto_spawn;
        let attachments: Vec<AttachmentInput> = req.attachments.iter().filter_map(parse_attachment).collect();
        let from = req.from.clone().unwrap_or_else(|| "host".to_string());
        let task = req.task;

        tokio::spawn(async move {
            let outcome = run_worker_prompt(&context, &worker_id, &profile, &task, attachments, timeout, job_id, &from, auto_spawn).await;
            match outcome {
                Ok(text) => {
                    let _ = context.jobs.set_result(job_id, text);
                }
                Err(e) => {
                    let _ = context.jobs.set_error(job_id, e);
                }
            }
        });

        Ok(TaskStartResponse::new(job_id, TaskKind::Worker))
    }

    async fn start_workflow_job(&self, req: TaskStartRequest) -> Result<TaskStartResponse, ApiError> {
        let context = self.context.clone();
        let job_id_run = if let Some(run_id) = req.continue_run_id {
            run_id
        } else {
            RunId::new()
        };
        let job = self.context.jobs.create(JobTarget::Workflow(job_id_run), req.task.clone(), None, req.from.clone());
        let job_id = job.id;

        let continue_run_id = req.continue_run_id;
        let workflow_id = req.workflow_id.clone();
        let auto_spawn = req.auto_spawn;
        let task = req.task.clone();
        let attachments = req.attachments.clone();

        let ui_policy = req.ui_policy;
        tokio::spawn(async move {
            let outcome = run_workflow(&context, continue_run_id, workflow_id, task, attachments, auto_spawn, ui_policy).await;
            match outcome {
                Ok(text) => {
                    let _ = context.jobs.set_result(job_id, text);
                }
                Err(e) => {
                    let _ = context.jobs.set_error(job_id, e);
                }
            }
        });

        Ok(TaskStartResponse::new(job_id, TaskKind::Workflow))
    }

    /// `task_await`: blocks (per job, sequentially) until every
    /// selected job is terminal or `timeout_ms` elapses, spec §8
    /// scenario S5's exact error message on timeout.
    pub async fn task_await(&self, selector: orc_wire::TaskIdSelector, timeout_ms: Option<u64>) -> Result<Vec<Job>, ApiError> {
        let timeout_ms = timeout_ms.unwrap_or_else(|| self.context.config.prompt_timeout_ms);
        let mut jobs = Vec::new();
        for id in selector.into_vec() {
            jobs.push(self.context.jobs.await_job(id, timeout_ms).await?);
        }
        Ok(jobs)
    }

    /// `task_peek`: current snapshot, or an `{id, status:"unknown"}`
    /// placeholder for an id the registry has already pruned or never saw.
    pub fn task_peek(&self, selector: orc_wire::TaskIdSelector) -> Vec<PeekResult> {
        selector
            .into_vec()
            .into_iter()
            .map(|id| match self.context.jobs.peek(id) {
                Some(job) => PeekResult::Known(job),
                None => PeekResult::Unknown { id, status: "unknown" },
            })
            .collect()
    }

    /// `task_cancel`: best-effort (spec §5); always returns a
    /// confirmation string rather than surfacing per-id failures, since
    /// canceling an already-terminal or unknown job is a no-op.
    pub fn task_cancel(&self, req: TaskCancelRequest) -> String {
        let ids = req.ids.into_vec();
        for &id in &ids {
            let _ = self.context.jobs.cancel(id, req.reason.clone());
        }
        format!("canceled {} task(s)", ids.len())
    }

    /// Notify the orchestrator that a session ended, stopping every
    /// worker it still owns (spec §3 ownership).
    pub async fn session_ended(&self, session_id: &orc_core::SessionId) {
        self.context.session_ended(session_id).await;
    }

    /// `task_list`: renders the requested view in the requested format
    /// (SPEC_FULL §10.6).
    pub fn task_list(&self, req: TaskListRequest) -> String {
        let view = req.view.unwrap_or(TaskListView::Tasks);
        let format = req.format.unwrap_or(TaskListFormat::Json);
        let value = self.render_view(view, &req);
        match format {
            TaskListFormat::Json => serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string()),
            TaskListFormat::Markdown => render_markdown(view, &value),
        }
    }

    fn render_view(&self, view: TaskListView, req: &TaskListRequest) -> serde_json::Value {
        match view {
            TaskListView::Tasks | TaskListView::Output => {
                let target = req.worker_id.map(JobTarget::Worker);
                serde_json::to_value(self.context.jobs.list(target.as_ref(), req.limit)).unwrap_or_default()
            }
            TaskListView::Workers => serde_json::to_value(self.context.pool.list()).unwrap_or_default(),
            TaskListView::Profiles => serde_json::to_value(self.context.profiles.list()).unwrap_or_default(),
            TaskListView::Models => serde_json::to_value(&*self.context.providers.read()).unwrap_or_default(),
            TaskListView::Workflows => {
                let names: Vec<String> = self.context.workflows.list().into_iter().map(|d| d.name).collect();
                serde_json::to_value(names).unwrap_or_default()
            }
            TaskListView::Status => serde_json::to_value(self.context.metrics_snapshot()).unwrap_or_default(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_worker_prompt<C: Clock + 'static>(
    context: &Arc<OrchestratorContext<C>>,
    worker_id: &WorkerProfileId,
    profile: &orc_core::WorkerProfile,
    task: &str,
    attachments: Vec<AttachmentInput>,
    timeout: Duration,
    job_id: orc_core::JobId,
    from: &str,
    auto_spawn: bool,
) -> Result<String, String> {
    context
        .spawn_worker(profile, SpawnOptions { auto_spawn, parent_session_id: None })
        .await
        .map_err(|e| e.to_string())?;
    let job_id_str = job_id.to_string();
    context
        .send_prompt(worker_id, task, attachments, timeout, Some(&job_id_str), from)
        .await
        .map(|outcome| outcome.response)
        .map_err(|e| e.to_string())
}

fn default_workflow_ui() -> orc_core::workflow::WorkflowUi {
    orc_core::workflow::WorkflowUi {
        execution: orc_core::workflow::ExecutionGate::Auto,
        intervene: orc_core::workflow::InterveneGate::OnError,
    }
}

async fn run_workflow<C: Clock + 'static>(
    context: &Arc<OrchestratorContext<C>>,
    continue_run_id: Option<RunId>,
    workflow_id: Option<String>,
    task: String,
    attachments: Vec<serde_json::Value>,
    auto_spawn: bool,
    ui_policy: Option<orc_core::workflow::WorkflowUi>,
) -> Result<String, String> {
    let runner = context.workflow_runner();
    let state = if let Some(run_id) = continue_run_id {
        runner
            .continue_workflow(&run_id, context.workflows.as_ref(), context.skills.as_ref(), ui_policy)
            .await
            .map_err(|e| e.to_string())?
    } else {
        let workflow_id = workflow_id.ok_or_else(|| "workflowId is required to start a workflow".to_string())?;
        let def = context
            .workflows
            .get(&orc_core::WorkflowId::from(workflow_id.as_str()))
            .ok_or_else(|| format!("unknown workflow {workflow_id}"))?;
        runner
            .start_workflow(
                &def,
                orc_workflow::StartWorkflowRequest {
                    task,
                    carry: None,
                    attachments,
                    auto_spawn,
                    limits: context.config.workflow_limits,
                    ui: ui_policy.unwrap_or_else(default_workflow_ui),
                    parent_session_id: None,
                },
                context.skills.as_ref(),
            )
            .await
            .map_err(|e| e.to_string())?
    };
    serde_json::to_string(&state).map_err(|e| e.to_string())
}

fn resolve_kind(req: &TaskStartRequest) -> Result<TaskKind, ApiError> {
    match req.kind {
        Some(TaskKind::Worker) => Ok(TaskKind::Worker),
        Some(TaskKind::Workflow) => Ok(TaskKind::Workflow),
        Some(TaskKind::Auto) | None => {
            if req.continue_run_id.is_some() || req.workflow_id.is_some() {
                Ok(TaskKind::Workflow)
            } else if req.worker_id.is_some() {
                Ok(TaskKind::Worker)
            } else {
                Err(ApiError::UnknownKind)
            }
        }
    }
}

fn parse_attachment(value: &serde_json::Value) -> Option<AttachmentInput> {
    if let Some(path) = value.get("path").and_then(|v| v.as_str()) {
        return Some(AttachmentInput::Path(PathBuf::from(path)));
    }
    let data = value.get("data").and_then(|v| v.as_str())?.to_string();
    let filename = value.get("filename").and_then(|v| v.as_str()).unwrap_or("attachment.bin").to_string();
    Some(AttachmentInput::Base64 { data, filename })
}

fn render_markdown(view: TaskListView, value: &serde_json::Value) -> String {
    let label = match view {
        TaskListView::Tasks => "Tasks",
        TaskListView::Workers => "Workers",
        TaskListView::Profiles => "Profiles",
        TaskListView::Models => "Models",
        TaskListView::Workflows => "Workflows",
        TaskListView::Status => "Status",
        TaskListView::Output => "Output",
    };
    let serde_json::Value::Array(items) = value else {
        return format!("# {label}\n\n```json\n{value}\n```\n");
    };
    if items.is_empty() {
        return format!("# {label}\n\n(none)\n");
    }
    let mut out = format!("# {label}\n\n");
    for item in items {
        out.push_str("- ");
        out.push_str(&item.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
