// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker Pool (spec §4.B "the heart"): single source of truth for
//! live workers, single spawn gate per `workerId`. Grounded on spec
//! §9's explicit re-architecture guidance ("re-model as a per-key
//! mutex-guarded map of futures... `Map<WorkerId, Shared<Future<
//! WorkerInstance>>>`, cleared only when the stored future equals the
//! caller's"): the in-flight map holds a generation-tagged
//! `futures::future::Shared`, and a spawn is only evicted from the map
//! by the generation that created it, matching "iff the stored promise
//! is still the current one". `parking_lot::Mutex` guards the
//! synchronous state, matching `orc_registry::JobRegistry`'s locking
//! idiom.

use crate::bus::EventBus;
use crate::error::PoolError;
use crate::metrics::Metrics;
use futures::future::{BoxFuture, FutureExt, Shared};
use orc_backend::{HttpOcServerClient, OcServerClient, SpawnedWorker, WorkerShutdown};
use orc_core::event::{EventPayload, ErrorPayload, OrchestratorEvent, WorkerStatusPayload};
use orc_core::{Clock, SessionId, WorkerInstance, WorkerKind, WorkerProfile, WorkerProfileId, WorkerStatus};
use orc_registry::{DeviceRegistry, Liveness};
use orc_wire::DeviceRegistryEntry;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Spec §4.B reuse step 3: "a 3-second timeout" on the `session.list` probe.
const REUSE_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct SpawnOptions {
    pub auto_spawn: bool,
    /// The session that triggered this `getOrSpawn`, for ownership
    /// tracking on a fresh spawn (never on a reuse, spec §8 invariant 7).
    pub parent_session_id: Option<SessionId>,
}

struct WorkerEntry {
    instance: WorkerInstance,
    client: Arc<dyn OcServerClient>,
    shutdown: WorkerShutdown,
}

type SpawnOutcome = Result<(WorkerInstance, Arc<dyn OcServerClient>, WorkerShutdown, bool), Arc<PoolError>>;
type SharedSpawn = Shared<BoxFuture<'static, SpawnOutcome>>;

struct PoolState {
    workers: HashMap<WorkerProfileId, WorkerEntry>,
    in_flight: HashMap<WorkerProfileId, (u64, SharedSpawn)>,
    session_ownership: HashMap<SessionId, HashSet<WorkerProfileId>>,
}

pub struct WorkerPool<C: Clock> {
    state: parking_lot::Mutex<PoolState>,
    generation: AtomicU64,
    bus: Arc<EventBus>,
    metrics: Arc<Metrics>,
    device_registry: Option<Arc<DeviceRegistry>>,
    liveness: Arc<dyn Liveness>,
    orchestrator_instance_id: String,
    clock: C,
}

impl<C: Clock> WorkerPool<C> {
    pub fn new(
        bus: Arc<EventBus>,
        metrics: Arc<Metrics>,
        device_registry: Option<Arc<DeviceRegistry>>,
        liveness: Arc<dyn Liveness>,
        orchestrator_instance_id: impl Into<String>,
        clock: C,
    ) -> Self {
        Self {
            state: parking_lot::Mutex::new(PoolState {
                workers: HashMap::new(),
                in_flight: HashMap::new(),
                session_ownership: HashMap::new(),
            }),
            generation: AtomicU64::new(0),
            bus,
            metrics,
            device_registry,
            liveness,
            orchestrator_instance_id: orchestrator_instance_id.into(),
            clock,
        }
    }

    pub fn get(&self, worker_id: &WorkerProfileId) -> Option<WorkerInstance> {
        self.state.lock().workers.get(worker_id).map(|e| e.instance.clone())
    }

    pub fn client(&self, worker_id: &WorkerProfileId) -> Option<Arc<dyn OcServerClient>> {
        self.state.lock().workers.get(worker_id).map(|e| e.client.clone())
    }

    pub fn list(&self) -> Vec<WorkerInstance> {
        self.state.lock().workers.values().map(|e| e.instance.clone()).collect()
    }

    /// Spec §4.B `getOrSpawn`. `spawn_fn` is called at most once per
    /// concurrent burst for `profile.id` (steps 1-4); it is not invoked
    /// at all if a Device Registry reuse succeeds first (server kind
    /// only).
    pub async fn get_or_spawn<F, Fut>(
        &self,
        profile: &WorkerProfile,
        options: SpawnOptions,
        spawn_fn: F,
    ) -> Result<WorkerInstance, Arc<PoolError>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<SpawnedWorker, orc_backend::BackendError>> + Send + 'static,
    {
        // Step 1: a live, non-terminal instance already exists.
        if let Some(instance) = self.live_instance(&profile.id) {
            return Ok(instance);
        }

        // Step 2/3: join an in-flight spawn, or become the one that starts it.
        let (generation, shared) = {
            let mut state = self.state.lock();
            if let Some(instance) = state
                .workers
                .get(&profile.id)
                .map(|e| &e.instance)
                .filter(|i| i.status != WorkerStatus::Error && i.status != WorkerStatus::Stopped)
            {
                return Ok(instance.clone());
            }
            if let Some((gen, shared)) = state.in_flight.get(&profile.id) {
                (*gen, shared.clone())
            } else {
                let gen = self.generation.fetch_add(1, Ordering::SeqCst);
                let shared = self.spawn_future(profile.clone(), spawn_fn);
                state.in_flight.insert(profile.id, (gen, shared.clone()));
                self.publish_starting(profile);
                (gen, shared)
            }
        };

        let outcome = shared.await;

        {
            let mut state = self.state.lock();
            if matches!(state.in_flight.get(&profile.id), Some((g, _)) if *g == generation) {
                state.in_flight.remove(&profile.id);
            }
        }

        match outcome {
            Ok((instance, client, shutdown, reused)) => {
                self.register(instance.clone(), client, shutdown);
                if !reused {
                    if let Some(session_id) = options.parent_session_id {
                        self.track_ownership(session_id, profile.id);
                    }
                }
                Ok(instance)
            }
            Err(e) => {
                self.publish_error(&profile.id, &e.to_string());
                Err(e)
            }
        }
    }

    fn live_instance(&self, worker_id: &WorkerProfileId) -> Option<WorkerInstance> {
        let state = self.state.lock();
        state
            .workers
            .get(worker_id)
            .map(|e| &e.instance)
            .filter(|i| i.status != WorkerStatus::Error && i.status != WorkerStatus::Stopped)
            .cloned()
    }

    fn spawn_future<F, Fut>(&self, profile: WorkerProfile, spawn_fn: F) -> SharedSpawn
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<SpawnedWorker, orc_backend::BackendError>> + Send + 'static,
    {
        let device_registry = self.device_registry.clone();
        let liveness = self.liveness.clone();
        let orchestrator_instance_id = self.orchestrator_instance_id.clone();
        let clock = self.clock.clone();
        let metrics = self.metrics.clone();
        let worker_id = profile.id;

        let fut: BoxFuture<'static, SpawnOutcome> = Box::pin(async move {
            if profile.kind == WorkerKind::Server {
                if let Some(registry) = &device_registry {
                    if let Some((instance, client, shutdown)) =
                        try_reuse(registry, liveness.as_ref(), &profile, &orchestrator_instance_id, &clock).await
                    {
                        metrics.record_reuse();
                        return Ok((instance, client, shutdown, true));
                    }
                }
            }
            match spawn_fn().await {
                Ok(spawned) => {
                    metrics.record_spawn();
                    Ok((spawned.instance, spawned.client, spawned.shutdown, false))
                }
                Err(e) => Err(Arc::new(PoolError::SpawnFailed { worker_id: worker_id.to_string(), source: e })),
            }
        });
        fut.shared()
    }

    fn publish_starting(&self, profile: &WorkerProfile) {
        let now = self.clock.epoch_ms();
        let placeholder = WorkerInstance {
            profile_id: profile.id,
            name: profile.name.clone(),
            status: WorkerStatus::Starting,
            port: None,
            pid: None,
            server_url: None,
            session_id: None,
            parent_session_id: None,
            started_at: now,
            last_activity: now,
            current_task: None,
            warning: None,
            error: None,
            last_result: None,
            model_resolution: None,
            kind: profile.kind,
            execution: profile.execution,
        };
        self.bus.publish(OrchestratorEvent::new(
            now,
            EventPayload::WorkerStatus(WorkerStatusPayload {
                worker: placeholder,
                status: WorkerStatus::Starting,
                previous_status: None,
                reason: "spawn".to_string(),
            }),
        ));
    }

    fn publish_error(&self, worker_id: &WorkerProfileId, message: &str) {
        self.bus.publish(OrchestratorEvent::new(
            self.clock.epoch_ms(),
            EventPayload::Error(ErrorPayload { scope: "pool".to_string(), message: message.to_string(), worker_id: Some(*worker_id) }),
        ));
    }

    /// Spec §4.B `register`: insert/replace the live entry and emit
    /// `spawn` + `orchestra.worker.status`.
    pub fn register(&self, instance: WorkerInstance, client: Arc<dyn OcServerClient>, shutdown: WorkerShutdown) {
        let previous_status = {
            let mut state = self.state.lock();
            let previous = state.workers.get(&instance.profile_id).map(|e| e.instance.status);
            state.workers.insert(instance.profile_id, WorkerEntry { instance: instance.clone(), client, shutdown });
            previous
        };
        self.bus.publish(OrchestratorEvent::new(
            self.clock.epoch_ms(),
            EventPayload::WorkerStatus(WorkerStatusPayload {
                status: instance.status,
                worker: instance,
                previous_status,
                reason: "spawn".to_string(),
            }),
        ));
    }

    /// Spec §4.B `unregister`: drop ownership links, emit `stop` +
    /// `status=stopped`.
    pub fn unregister(&self, worker_id: &WorkerProfileId) {
        let removed = {
            let mut state = self.state.lock();
            state.session_ownership.values_mut().for_each(|owned| {
                owned.remove(worker_id);
            });
            state.workers.remove(worker_id)
        };
        let Some(entry) = removed else { return };
        let mut stopped = entry.instance;
        let previous_status = stopped.status;
        stopped.status = WorkerStatus::Stopped;
        self.bus.publish(OrchestratorEvent::new(
            self.clock.epoch_ms(),
            EventPayload::WorkerStatus(WorkerStatusPayload {
                worker: stopped,
                status: WorkerStatus::Stopped,
                previous_status: Some(previous_status),
                reason: "stop".to_string(),
            }),
        ));
    }

    /// Like [`unregister`](Self::unregister), but also runs the
    /// worker's shutdown action (spec §3 ownership: "session deletion
    /// triggers stop of owned-but-not-reused workers").
    pub async fn stop(&self, worker_id: &WorkerProfileId) {
        let removed = {
            let mut state = self.state.lock();
            state.session_ownership.values_mut().for_each(|owned| {
                owned.remove(worker_id);
            });
            state.workers.remove(worker_id)
        };
        let Some(entry) = removed else { return };
        if let Err(err) = entry.shutdown.run().await {
            tracing::warn!(worker_id = %worker_id, error = %err, "worker shutdown failed");
        }
        let mut stopped = entry.instance;
        let previous_status = stopped.status;
        stopped.status = WorkerStatus::Stopped;
        self.bus.publish(OrchestratorEvent::new(
            self.clock.epoch_ms(),
            EventPayload::WorkerStatus(WorkerStatusPayload {
                worker: stopped,
                status: WorkerStatus::Stopped,
                previous_status: Some(previous_status),
                reason: "stop".to_string(),
            }),
        ));
    }

    /// Spec §4.B `updateStatus`: publishes locally and globally; an
    /// `error` status also publishes `orchestra.error`.
    pub fn update_status(&self, worker_id: &WorkerProfileId, status: WorkerStatus, error: Option<String>) -> Result<(), PoolError> {
        let (instance, previous_status) = {
            let mut state = self.state.lock();
            let entry = state
                .workers
                .get_mut(worker_id)
                .ok_or_else(|| PoolError::UnknownWorker { worker_id: worker_id.to_string() })?;
            let previous = entry.instance.status;
            entry.instance.status = status;
            entry.instance.last_activity = self.clock.epoch_ms();
            if let Some(err) = &error {
                entry.instance.error = Some(err.clone());
            }
            (entry.instance.clone(), previous)
        };
        self.bus.publish(OrchestratorEvent::new(
            self.clock.epoch_ms(),
            EventPayload::WorkerStatus(WorkerStatusPayload {
                worker: instance,
                status,
                previous_status: Some(previous_status),
                reason: "update".to_string(),
            }),
        ));
        if status == WorkerStatus::Error {
            self.publish_error(worker_id, error.as_deref().unwrap_or("worker entered error status"));
        }
        Ok(())
    }

    /// Applies `f` to the stored instance (used after a prompt round-trip
    /// updates `last_activity`/`current_task`/`last_result`) and publishes
    /// a status event only if `status` itself changed.
    pub fn update_instance<F>(&self, worker_id: &WorkerProfileId, f: F) -> Result<WorkerInstance, PoolError>
    where
        F: FnOnce(&mut WorkerInstance),
    {
        let (instance, previous_status) = {
            let mut state = self.state.lock();
            let entry = state
                .workers
                .get_mut(worker_id)
                .ok_or_else(|| PoolError::UnknownWorker { worker_id: worker_id.to_string() })?;
            let previous = entry.instance.status;
            f(&mut entry.instance);
            (entry.instance.clone(), previous)
        };
        if instance.status != previous_status {
            self.bus.publish(OrchestratorEvent::new(
                self.clock.epoch_ms(),
                EventPayload::WorkerStatus(WorkerStatusPayload {
                    worker: instance.clone(),
                    status: instance.status,
                    previous_status: Some(previous_status),
                    reason: "update".to_string(),
                }),
            ));
        }
        Ok(instance)
    }

    pub fn track_ownership(&self, session_id: SessionId, worker_id: WorkerProfileId) {
        self.state.lock().session_ownership.entry(session_id).or_default().insert(worker_id);
    }

    pub fn clear_session_ownership(&self, session_id: &SessionId) -> HashSet<WorkerProfileId> {
        self.state.lock().session_ownership.remove(session_id).unwrap_or_default()
    }

    pub fn owned_by(&self, session_id: &SessionId) -> HashSet<WorkerProfileId> {
        self.state.lock().session_ownership.get(session_id).cloned().unwrap_or_default()
    }

    /// Spec §4.B `stopAll`: best-effort concurrent shutdown of every
    /// instance, then clear all pool state.
    pub async fn stop_all(&self) {
        let entries: Vec<_> = {
            let mut state = self.state.lock();
            let entries: Vec<_> = state.workers.drain().map(|(_, e)| e).collect();
            state.in_flight.clear();
            state.session_ownership.clear();
            entries
        };
        let shutdowns = entries.into_iter().map(|e| async move {
            if let Err(err) = e.shutdown.run().await {
                tracing::warn!(worker_id = %e.instance.profile_id, error = %err, "worker shutdown failed");
            }
        });
        futures::future::join_all(shutdowns).await;
    }
}

/// Spec §4.B "Reuse from Device Registry" (kind=server only), steps 1-5.
async fn try_reuse<C: Clock>(
    device_registry: &DeviceRegistry,
    liveness: &dyn Liveness,
    profile: &WorkerProfile,
    orchestrator_instance_id: &str,
    clock: &C,
) -> Option<(WorkerInstance, Arc<dyn OcServerClient>, WorkerShutdown)> {
    let candidate = device_registry.entries_for_worker(liveness, &profile.id).into_iter().find(|e| {
        matches!(e, DeviceRegistryEntry::Worker { status, url, .. }
            if matches!(status, WorkerStatus::Ready | WorkerStatus::Busy) && url.is_some())
    })?;
    let DeviceRegistryEntry::Worker { pid, url: Some(url), session_id: existing_session_id, .. } = candidate else {
        return None;
    };

    let client = HttpOcServerClient::new(url.clone());
    // This build has no per-profile workspace directory to probe with;
    // an empty directory is accepted by the OCServer RPC contract (§6.2)
    // as "unscoped".
    let sessions = match tokio::time::timeout(REUSE_PROBE_TIMEOUT, client.session_list("")).await {
        Ok(Ok(sessions)) => sessions,
        _ => return None,
    };

    let wanted_title = format!("Worker: {}", profile.name);
    let session_id = existing_session_id
        .filter(|sid| sessions.iter().any(|s| &s.id == sid))
        .or_else(|| sessions.iter().find(|s| s.title.as_deref() == Some(wanted_title.as_str())).map(|s| s.id.clone()));
    let session_id = match session_id {
        Some(id) => id,
        None => client.session_create(&wanted_title).await.ok()?,
    };

    let now = clock.epoch_ms();
    let instance = WorkerInstance {
        profile_id: profile.id,
        name: profile.name.clone(),
        status: WorkerStatus::Ready,
        port: None,
        pid: Some(pid),
        server_url: Some(url.clone()),
        session_id: Some(session_id.clone()),
        parent_session_id: None,
        started_at: now,
        last_activity: now,
        current_task: None,
        warning: None,
        error: None,
        last_result: None,
        model_resolution: Some("reused existing worker".to_string()),
        kind: WorkerKind::Server,
        execution: profile.execution,
    };

    let _ = device_registry.upsert_worker(
        liveness,
        DeviceRegistryEntry::Worker {
            orchestrator_instance_id: orchestrator_instance_id.to_string(),
            host_pid: std::process::id(),
            worker_id: profile.id,
            pid,
            url: Some(url),
            port: None,
            session_id: Some(session_id),
            status: WorkerStatus::Ready,
            started_at: instance.started_at,
            updated_at: now,
            last_error: None,
        },
    );

    Some((instance, Arc::new(client), WorkerShutdown::Server { pid, done: Arc::new(AtomicBool::new(false)) }))
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
