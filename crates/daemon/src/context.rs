// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Orchestrator Context (spec §4.H): assembles the Worker Pool,
//! Event Bus, Bridge, Job Registry, Device Registry, Model Resolver
//! and Workflow Runner into the thing the public API (`api.rs`) calls
//! into. Configuration (ambient-stack supplement, SPEC_FULL §10.4) is
//! `serde::Deserialize` so the embedding host can load it from its own
//! config file/env the way the teacher's `oj-daemon` loads its own
//! daemon config, but construction itself (wiring live objects
//! together) stays ordinary Rust code, not a config-driven factory.

use crate::bridge::{self, BridgeState};
use crate::bus::EventBus;
use crate::error::PoolError;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::pool::{SpawnOptions, WorkerPool};
use async_trait::async_trait;
use orc_backend::{OcServerClient, SendRequest, SpawnServerRequest, SpawnedWorker};
use orc_core::event::OrchestratorEvent;
use orc_core::workflow::WorkflowLimits;
use orc_core::{Clock, SessionId, WorkerKind, WorkerProfile, WorkerProfileId, WorkflowId};
use orc_registry::{DeviceRegistry, JobRegistry, Liveness, SystemLiveness};
use orc_resolver::{Provider, ResolverConfig};
use orc_workflow::{PauseStore, WorkflowCatalog, WorkflowDefinition, WorkflowError, WorkflowHost, WorkflowRunner};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

/// Ambient-stack configuration (SPEC_FULL §10.4), constructed by the
/// embedding host.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfig {
    pub state_dir: PathBuf,
    #[serde(default = "default_bridge_bind")]
    pub bridge_bind_addr: SocketAddr,
    #[serde(default = "default_spawn_ready_timeout_ms")]
    pub spawn_ready_timeout_ms: u64,
    /// Spec §5: "every prompt has a hard deadline (default 600s)".
    #[serde(default = "default_prompt_timeout_ms")]
    pub prompt_timeout_ms: u64,
    #[serde(default)]
    pub workflow_limits: WorkflowLimits,
    #[serde(default = "default_ocserve_command")]
    pub ocserve_command: String,
    pub orchestrator_instance_id: String,
}

fn default_bridge_bind() -> SocketAddr {
    "127.0.0.1:0".parse().expect("valid loopback address")
}

fn default_spawn_ready_timeout_ms() -> u64 {
    30_000
}

fn default_prompt_timeout_ms() -> u64 {
    600_000
}

fn default_ocserve_command() -> String {
    "opencode".to_string()
}

impl OrchestratorConfig {
    pub fn spawn_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.spawn_ready_timeout_ms)
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_millis(self.prompt_timeout_ms)
    }
}

/// In-memory `WorkerProfile` lookup, populated by the embedding host at
/// startup (profiles are static config, not something this build
/// discovers at runtime).
#[derive(Default)]
pub struct WorkerProfileCatalog(RwLock<HashMap<WorkerProfileId, WorkerProfile>>);

impl WorkerProfileCatalog {
    pub fn new(profiles: impl IntoIterator<Item = WorkerProfile>) -> Self {
        Self(RwLock::new(profiles.into_iter().map(|p| (p.id, p)).collect()))
    }

    pub fn get(&self, id: &WorkerProfileId) -> Option<WorkerProfile> {
        self.0.read().get(id).cloned()
    }

    pub fn insert(&self, profile: WorkerProfile) {
        self.0.write().insert(profile.id, profile);
    }

    pub fn list(&self) -> Vec<WorkerProfile> {
        self.0.read().values().cloned().collect()
    }
}

/// In-memory `WorkflowDefinition` lookup; same rationale as
/// [`WorkerProfileCatalog`].
#[derive(Default)]
pub struct InMemoryWorkflowCatalog(RwLock<HashMap<WorkflowId, WorkflowDefinition>>);

impl InMemoryWorkflowCatalog {
    pub fn new(defs: impl IntoIterator<Item = WorkflowDefinition>) -> Self {
        Self(RwLock::new(defs.into_iter().map(|d| (d.id.clone(), d)).collect()))
    }

    pub fn insert(&self, def: WorkflowDefinition) {
        self.0.write().insert(def.id.clone(), def);
    }

    pub fn list(&self) -> Vec<WorkflowDefinition> {
        self.0.read().values().cloned().collect()
    }
}

impl WorkflowCatalog for InMemoryWorkflowCatalog {
    fn get(&self, id: &WorkflowId) -> Option<WorkflowDefinition> {
        self.0.read().get(id).cloned()
    }
}

/// Everything wired together: the live state a running orchestrator
/// needs, shared behind `Arc` by every handler/task that touches it.
pub struct OrchestratorContext<C: Clock> {
    pub config: OrchestratorConfig,
    pub pool: Arc<WorkerPool<C>>,
    pub bus: Arc<EventBus>,
    pub metrics: Arc<Metrics>,
    pub jobs: Arc<JobRegistry<C>>,
    pub device_registry: Option<Arc<DeviceRegistry>>,
    pub liveness: Arc<dyn Liveness>,
    pub profiles: Arc<WorkerProfileCatalog>,
    pub workflows: Arc<InMemoryWorkflowCatalog>,
    pub skills: Arc<orc_workflow::SkillPermissionMap>,
    pub resolver_config: ResolverConfig,
    pub providers: RwLock<Vec<Provider>>,
    pub bridge_token: String,
    pub bridge_state: Arc<BridgeState<C>>,
    pub clock: C,
    attachment_counter: AtomicU64,
    /// Set once the embedding host has actually bound the Bridge's
    /// listener (its port may be OS-assigned, spec §4.G), so spawned
    /// workers get the real `OPENCODE_ORCH_BRIDGE_URL` (spec §6.5).
    bridge_addr: RwLock<Option<SocketAddr>>,
}

impl<C: Clock + 'static> OrchestratorContext<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: OrchestratorConfig,
        clock: C,
        profiles: WorkerProfileCatalog,
        workflows: InMemoryWorkflowCatalog,
        skills: orc_workflow::SkillPermissionMap,
        resolver_config: ResolverConfig,
        providers: Vec<Provider>,
        device_registry: Option<DeviceRegistry>,
    ) -> Arc<Self> {
        let metrics = Arc::new(Metrics::new());
        let bus = Arc::new(EventBus::new(metrics.clone()));
        let device_registry = device_registry.map(Arc::new);
        let liveness: Arc<dyn Liveness> = Arc::new(SystemLiveness);
        let pool = Arc::new(WorkerPool::new(
            bus.clone(),
            metrics.clone(),
            device_registry.clone(),
            liveness.clone(),
            config.orchestrator_instance_id.clone(),
            clock.clone(),
        ));
        let jobs = Arc::new(JobRegistry::new(clock.clone()));
        let bridge_token = bridge::generate_token();
        let bridge_state = BridgeState::new(bus.clone(), metrics.clone(), bridge_token.clone(), clock.clone());

        Arc::new(Self {
            config,
            pool,
            bus,
            metrics,
            jobs,
            device_registry,
            liveness,
            profiles: Arc::new(profiles),
            workflows: Arc::new(workflows),
            skills: Arc::new(skills),
            resolver_config,
            providers: RwLock::new(providers),
            bridge_token,
            bridge_state,
            clock,
            attachment_counter: AtomicU64::new(0),
            bridge_addr: RwLock::new(None),
        })
    }

    pub fn bridge_router(self: &Arc<Self>) -> axum::Router {
        bridge::router(self.bridge_state.clone())
    }

    /// Record the Bridge's actual bound address, once the embedding
    /// host has started listening on it.
    pub fn set_bridge_addr(&self, addr: SocketAddr) {
        *self.bridge_addr.write() = Some(addr);
    }

    fn bridge_url(&self) -> String {
        let addr = self.bridge_addr.read().unwrap_or(self.config.bridge_bind_addr);
        format!("http://{addr}")
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn workflow_runner(self: &Arc<Self>) -> WorkflowRunner<C> {
        let store = PauseStore::new(self.config.state_dir.join("workflow-runs"));
        WorkflowRunner::new(self.clone() as Arc<dyn WorkflowHost>, store, self.clock.clone())
    }

    /// Spec §4.B `getOrSpawn` entry point used by everything above the
    /// pool (the public API's `task_start`, the workflow host below).
    pub async fn spawn_worker(
        self: &Arc<Self>,
        profile: &WorkerProfile,
        options: SpawnOptions,
    ) -> Result<orc_core::WorkerInstance, Arc<PoolError>> {
        let ctx = self.clone();
        let profile_owned = profile.clone();
        self.pool
            .get_or_spawn(profile, options, move || {
                let ctx = ctx.clone();
                async move { ctx.do_spawn(&profile_owned).await }
            })
            .await
    }

    async fn do_spawn(self: &Arc<Self>, profile: &WorkerProfile) -> Result<SpawnedWorker, orc_backend::BackendError> {
        let providers = self.providers.read().clone();
        let resolution = orc_resolver::resolve(profile, &self.resolver_config, &providers)
            .map_err(|e| orc_backend::BackendError::SpawnFailed(e.to_string()))?;

        match profile.kind {
            WorkerKind::Server => {
                orc_backend::spawn_server(
                    SpawnServerRequest {
                        profile,
                        resolved_model: resolution.resolved_model,
                        ocserve_command: &self.config.ocserve_command,
                        bridge_url: &self.bridge_url(),
                        bridge_token: &self.bridge_token,
                        orchestrator_instance_id: &self.config.orchestrator_instance_id,
                        opencode_config_content: "",
                        base_dir: &self.config.state_dir,
                        ready_timeout: Some(self.config.spawn_ready_timeout()),
                    },
                    &self.clock,
                )
                .await
            }
            WorkerKind::Agent | WorkerKind::Subagent => {
                let client = self.any_server_client().ok_or_else(|| {
                    orc_backend::BackendError::SpawnFailed("no live server worker to host this agent".to_string())
                })?;
                orc_backend::spawn_agent(profile, resolution.resolved_model, client, None, &self.clock).await
            }
        }
    }

    fn any_server_client(&self) -> Option<Arc<dyn OcServerClient>> {
        self.pool.list().into_iter().find(|w| w.kind == WorkerKind::Server).and_then(|w| self.pool.client(&w.profile_id))
    }

    /// Send a prompt directly to a worker (spec §4.H, the public API's
    /// worker-kind `task_start` path; the workflow engine instead goes
    /// through `WorkflowHost::send_to_worker`).
    pub async fn send_prompt(
        &self,
        worker_id: &WorkerProfileId,
        message: &str,
        attachments: Vec<orc_backend::AttachmentInput>,
        timeout: Duration,
        job_id: Option<&str>,
        from: &str,
    ) -> Result<orc_backend::PromptOutcome, orc_backend::BackendError> {
        let client = self
            .pool
            .client(worker_id)
            .ok_or_else(|| orc_backend::BackendError::NotReady { status: "not registered".to_string() })?;
        let mut instance = self
            .pool
            .get(worker_id)
            .ok_or_else(|| orc_backend::BackendError::NotReady { status: "not registered".to_string() })?;

        let result = orc_backend::send_to_worker(
            &mut instance,
            client.as_ref(),
            SendRequest { message, attachments, timeout: Some(timeout), job_id, from, base_dir: &self.config.state_dir },
            &self.clock,
            &self.attachment_counter,
        )
        .await;

        let _ = self.pool.update_instance(worker_id, |stored| *stored = instance.clone());
        if result.is_err() {
            self.metrics.record_prompt_failure();
        }
        result
    }

    /// Graceful daemon shutdown (SPEC_FULL §10.6): stop every worker,
    /// bounded by `timeout`. Paused workflow runs need no extra flush
    /// here, the runner already persists them synchronously on every
    /// pause transition (`PauseStore::save` in the run loop).
    pub async fn shutdown(&self, timeout: Duration) {
        if tokio::time::timeout(timeout, self.pool.stop_all()).await.is_err() {
            tracing::warn!(?timeout, "worker pool shutdown exceeded timeout, some workers may still be running");
        }
    }

    /// Spec §3 ownership: when a session ends, every worker it owns
    /// (and that hasn't since been claimed by another session's reuse)
    /// is stopped rather than left running unattended.
    pub async fn session_ended(&self, session_id: &SessionId) {
        let owned = self.pool.clear_session_ownership(session_id);
        for worker_id in owned {
            self.pool.stop(&worker_id).await;
        }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowHost for OrchestratorContext<C> {
    async fn ensure_worker(&self, worker_id: &WorkerProfileId, auto_spawn: bool) -> Result<(), WorkflowError> {
        if self.pool.get(worker_id).is_some() {
            return Ok(());
        }
        if !auto_spawn {
            return Err(WorkflowError::WorkerUnavailable { worker_id: worker_id.to_string() });
        }
        let profile = self
            .profiles
            .get(worker_id)
            .ok_or_else(|| WorkflowError::UnknownWorkerProfile { worker_id: worker_id.to_string() })?;
        // Re-entering via the pool directly (not `Self::spawn_worker`,
        // which needs `Arc<Self>`): the workflow host is called through
        // a trait object, so only `&self` is available here.
        let providers = self.providers.read().clone();
        let resolution = orc_resolver::resolve(&profile, &self.resolver_config, &providers)
            .map_err(|e| WorkflowError::Backend(e.to_string()))?;
        let spawned = match profile.kind {
            WorkerKind::Server => orc_backend::spawn_server(
                SpawnServerRequest {
                    profile: &profile,
                    resolved_model: resolution.resolved_model,
                    ocserve_command: &self.config.ocserve_command,
                    bridge_url: &self.bridge_url(),
                    bridge_token: &self.bridge_token,
                    orchestrator_instance_id: &self.config.orchestrator_instance_id,
                    opencode_config_content: "",
                    base_dir: &self.config.state_dir,
                    ready_timeout: Some(self.config.spawn_ready_timeout()),
                },
                &self.clock,
            )
            .await
            .map_err(|e| WorkflowError::Backend(e.to_string()))?,
            WorkerKind::Agent | WorkerKind::Subagent => {
                let client = self
                    .any_server_client()
                    .ok_or_else(|| WorkflowError::Backend("no live server worker to host this agent".to_string()))?;
                orc_backend::spawn_agent(&profile, resolution.resolved_model, client, None, &self.clock)
                    .await
                    .map_err(|e| WorkflowError::Backend(e.to_string()))?
            }
        };
        self.pool.register(spawned.instance, spawned.client, spawned.shutdown);
        Ok(())
    }

    async fn send_to_worker(
        &self,
        worker_id: &WorkerProfileId,
        message: &str,
        timeout: Duration,
    ) -> Result<orc_workflow::WorkerSendOutcome, WorkflowError> {
        self.send_prompt(worker_id, message, Vec::new(), timeout, None, "workflow")
            .await
            .map(|outcome| orc_workflow::WorkerSendOutcome { response: outcome.response, warning: outcome.warning })
            .map_err(|e| WorkflowError::Backend(e.to_string()))
    }

    fn worker_required_skills(&self, worker_id: &WorkerProfileId) -> std::collections::BTreeSet<String> {
        self.profiles.get(worker_id).map(|p| p.required_skills).unwrap_or_default()
    }

    fn emit(&self, event: OrchestratorEvent) {
        self.bus.publish(event);
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
