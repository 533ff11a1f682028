// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties the process, client, attachment and prompt modules together
//! into the two Worker Backend variants (spec §4.D.1, §4.D.2, §4.D.3).
//! Grounded on `crates/adapters/src/agent/coop/adapter.rs`'s spawn /
//! send / kill shape, generalized from a single coop-sidecar backend
//! into the spec's server-vs-agent split.

use crate::attachment::{self, AttachmentInput};
use crate::client::{HttpOcServerClient, OcServerClient};
use crate::error::BackendError;
use crate::process::{self, SpawnedProcess};
use crate::prompt::{self, PromptSource};
use orc_core::{Clock, WorkerInstance, WorkerKind, WorkerProfile, WorkerStatus};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn bootstrap_prompt(profile: &WorkerProfile) -> String {
    format!(
        "{system}\n\nYou are worker `{id}` (\"{name}\"). \
         Use the `stream_chunk` tool to stream progress and always return a plain-text final answer.",
        system = profile.system_prompt,
        id = profile.id,
        name = profile.name,
    )
}

/// What a spawn produces: the live state snapshot the Worker Pool
/// stores, a client handle to keep talking to it, and a once-only
/// shutdown action (spec §3 ownership: "`shutdown` invoked exactly
/// once").
pub struct SpawnedWorker {
    pub instance: WorkerInstance,
    pub client: Arc<dyn OcServerClient>,
    pub shutdown: WorkerShutdown,
}

#[derive(Clone)]
pub enum WorkerShutdown {
    Server { pid: u32, done: Arc<AtomicBool> },
    Agent,
}

impl WorkerShutdown {
    /// Idempotent: a second call is a no-op (spec §4.D.1 shutdown
    /// contract).
    pub async fn run(&self) -> Result<(), BackendError> {
        match self {
            WorkerShutdown::Server { pid, done } => {
                if done.swap(true, Ordering::SeqCst) {
                    return Ok(());
                }
                process::shutdown_process_group(*pid, SHUTDOWN_GRACE).await
            }
            WorkerShutdown::Agent => Ok(()),
        }
    }
}

pub struct SpawnServerRequest<'a> {
    pub profile: &'a WorkerProfile,
    pub resolved_model: String,
    pub ocserve_command: &'a str,
    pub bridge_url: &'a str,
    pub bridge_token: &'a str,
    pub orchestrator_instance_id: &'a str,
    pub opencode_config_content: &'a str,
    pub base_dir: &'a Path,
    pub ready_timeout: Option<Duration>,
}

/// Env passed to the spawned `ocserve` process (spec §4.D.1 step 3):
/// the current process env plus the bridge/orchestrator overrides,
/// plus `OPENCODE_ORCHESTRATOR_WORKER=1` so the worker-side plugin
/// doesn't recursively load the orchestrator plugin.
fn build_server_env(req: &SpawnServerRequest<'_>) -> Vec<(String, String)> {
    let mut env: Vec<(String, String)> = std::env::vars().collect();
    env.push(("BRIDGE_URL".into(), req.bridge_url.into()));
    env.push(("BRIDGE_TOKEN".into(), req.bridge_token.into()));
    env.push(("ORCH_INSTANCE_ID".into(), req.orchestrator_instance_id.into()));
    env.push(("ORCH_WORKER_ID".into(), req.profile.id.to_string()));
    env.push(("OPENCODE_CONFIG_CONTENT".into(), req.opencode_config_content.into()));
    env.push(("OPENCODE_ORCHESTRATOR_WORKER".into(), "1".into()));
    env
}

/// Spec §4.D.1: spawn an `ocserve` subprocess, wait for it to accept
/// connections, probe for the `stream_chunk` tool, and send a no-reply
/// bootstrap prompt.
pub async fn spawn_server(req: SpawnServerRequest<'_>, clock: &impl Clock) -> Result<SpawnedWorker, BackendError> {
    if req.profile.kind != WorkerKind::Server {
        return Err(BackendError::SpawnFailed("spawn_server called with a non-server profile".into()));
    }
    let port = req.profile.pinned_port.unwrap_or(0);
    let env = build_server_env(&req);
    let args = vec!["--hostname=127.0.0.1".to_string(), format!("--port={port}")];

    let SpawnedProcess { mut child, pid } = process::spawn_detached(req.ocserve_command, &args, req.base_dir, &env)?;

    let ready_url = match process::wait_for_ready(&mut child, req.ready_timeout.unwrap_or(DEFAULT_READY_TIMEOUT)).await {
        Ok(url) => url,
        Err(e) => {
            let _ = process::shutdown_process_group(pid, SHUTDOWN_GRACE).await;
            return Err(e);
        }
    };

    let client = HttpOcServerClient::new(ready_url.clone());
    let directory = req.base_dir.to_string_lossy().to_string();
    let tools = client.tool_ids(&directory).await;
    let shutdown_on_error = |e: BackendError| {
        let pid = pid;
        async move {
            let _ = process::shutdown_process_group(pid, SHUTDOWN_GRACE).await;
            e
        }
    };
    let tools = match tools {
        Ok(t) => t,
        Err(e) => return Err(shutdown_on_error(e).await),
    };
    if !tools.iter().any(|t| t == "stream_chunk") {
        return Err(shutdown_on_error(BackendError::ToolMissing { tool: "stream_chunk".into() }).await);
    }

    let session_title = format!("Worker: {}", req.profile.name);
    let session_id = match client.session_create(&session_title).await {
        Ok(id) => id,
        Err(e) => return Err(shutdown_on_error(e).await),
    };

    let _ = client.prompt(&session_id, &bootstrap_prompt(req.profile), DEFAULT_PROMPT_TIMEOUT).await;
    tracing::info!(worker_id = %req.profile.id, %session_id, pid, "worker server ready");

    let now = clock.epoch_ms();
    let instance = WorkerInstance {
        profile_id: req.profile.id.clone(),
        name: req.profile.name.clone(),
        status: WorkerStatus::Ready,
        port: Some(port),
        pid: Some(pid),
        server_url: Some(ready_url),
        session_id: Some(session_id),
        parent_session_id: None,
        started_at: now,
        last_activity: now,
        current_task: None,
        warning: None,
        error: None,
        last_result: None,
        model_resolution: Some(req.resolved_model),
        kind: WorkerKind::Server,
        execution: req.profile.execution,
    };

    Ok(SpawnedWorker { instance, client: Arc::new(client), shutdown: WorkerShutdown::Server { pid, done: Arc::new(AtomicBool::new(false)) } })
}

/// Spec §4.D.2: no subprocess. `agent` creates a fresh session;
/// `subagent` forks the caller-supplied parent.
pub async fn spawn_agent(
    profile: &WorkerProfile,
    resolved_model: String,
    client: Arc<dyn OcServerClient>,
    parent_session_id: Option<orc_core::SessionId>,
    clock: &impl Clock,
) -> Result<SpawnedWorker, BackendError> {
    let session_id = match profile.kind {
        WorkerKind::Subagent => {
            let parent = parent_session_id
                .as_ref()
                .ok_or_else(|| BackendError::SpawnFailed("subagent requires a parent_session_id".into()))?;
            client.session_fork(parent.as_str()).await?
        }
        WorkerKind::Agent => client.session_create(&format!("Worker: {}", profile.name)).await?,
        WorkerKind::Server => return Err(BackendError::SpawnFailed("spawn_agent called with a server profile".into())),
    };

    let _ = client.prompt(&session_id, &bootstrap_prompt(profile), DEFAULT_PROMPT_TIMEOUT).await;
    tracing::info!(worker_id = %profile.id, %session_id, kind = %profile.kind, "worker agent session ready");

    let now = clock.epoch_ms();
    let instance = WorkerInstance {
        profile_id: profile.id.clone(),
        name: profile.name.clone(),
        status: WorkerStatus::Ready,
        port: None,
        pid: None,
        server_url: None,
        session_id: Some(session_id),
        parent_session_id,
        started_at: now,
        last_activity: now,
        current_task: None,
        warning: None,
        error: None,
        last_result: None,
        model_resolution: Some(resolved_model),
        kind: profile.kind,
        execution: profile.execution,
    };

    Ok(SpawnedWorker { instance, client, shutdown: WorkerShutdown::Agent })
}

pub struct SendRequest<'a> {
    pub message: &'a str,
    pub attachments: Vec<AttachmentInput>,
    pub timeout: Option<Duration>,
    pub job_id: Option<&'a str>,
    pub from: &'a str,
    pub base_dir: &'a Path,
}

/// A completed prompt round-trip: the extracted text plus any
/// non-fatal warning the extraction picked up along the way (spec
/// §4.D.3 step 7 "On success... set `warning`" is folded into this
/// return rather than only the failure path).
pub struct PromptOutcome {
    pub response: String,
    pub warning: Option<String>,
}

/// Spec §4.D.3: the send path shared by both backend variants.
pub async fn send_to_worker(
    worker: &mut WorkerInstance,
    client: &dyn OcServerClient,
    req: SendRequest<'_>,
    clock: &impl Clock,
    attachment_counter: &AtomicU64,
) -> Result<PromptOutcome, BackendError> {
    if worker.status != WorkerStatus::Ready {
        return Err(BackendError::NotReady { status: worker.status.to_string() });
    }
    let session_id = worker.session_id.clone().ok_or_else(|| BackendError::NotReady { status: "no session".into() })?;

    worker.status = WorkerStatus::Busy;
    worker.current_task = Some(req.message.chars().take(140).collect());

    let timeout = req.timeout.unwrap_or(DEFAULT_PROMPT_TIMEOUT);
    let started_at = clock.epoch_ms();
    let normalized = attachment::normalize(&req.attachments, req.base_dir, &worker.profile_id.to_string(), clock.epoch_ms(), attachment_counter);

    let result = match normalized {
        Ok(normalized) => {
            let body = prompt::compose(req.message, &PromptSource { from: req.from, job_id: req.job_id });
            let outcome = match client.prompt(&session_id, &body, timeout).await {
                Ok(message) => prompt::extract_with_fallback(client, &session_id, message, timeout).await,
                Err(e) => Err(e),
            };
            attachment::cleanup(&normalized);
            outcome
        }
        Err(e) => Err(e),
    };

    let finished_at = clock.epoch_ms();
    worker.status = WorkerStatus::Ready;
    worker.last_activity = finished_at;

    match result {
        Ok(extracted) => {
            worker.warning = extracted.warning.clone();
            if let Some(job_id) = req.job_id.and_then(|s| orc_core::Uid::from_string(s).ok()) {
                worker.last_result = Some(orc_core::LastResult {
                    at: finished_at,
                    job_id: orc_core::JobId(job_id),
                    response: Some(extracted.text.clone()),
                    report: None,
                    duration_ms: finished_at.saturating_sub(started_at),
                });
            }
            Ok(PromptOutcome { response: extracted.text, warning: extracted.warning })
        }
        Err(e) => {
            tracing::warn!(worker_id = %worker.profile_id, error = %e, "send_to_worker failed");
            worker.warning = Some(e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
