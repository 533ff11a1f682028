// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Workflow Runner itself (spec §4.F: validation, then the
//! execution loop, gating, pause persistence, events). No teacher
//! analog for the loop's shape (see module docs on the crate as a
//! whole); the [`WorkflowHost`] seam mirrors the object-safe
//! dependency-inversion pattern already used by `orc_registry::
//! Liveness` and `orc_backend::OcServerClient`, decoupling this crate
//! from the worker pool and event bus that will live in the daemon.

use crate::definition::WorkflowDefinition;
use crate::error::WorkflowError;
use crate::gate::{self, GateDecision};
use crate::prompt::compose_step_prompt;
use crate::skills::{validate_skills, SkillRegistry};
use crate::store::PauseStore;
use async_trait::async_trait;
use orc_core::event::{
    EventPayload, OrchestratorEvent, WorkflowCompletedPayload, WorkflowStartedPayload, WorkflowStepPayload,
};
use orc_core::workflow::{
    StepStatus, WorkflowLimits, WorkflowRunState, WorkflowStatus, WorkflowStepResult, WorkflowUi,
};
use orc_core::{Clock, RunId, SessionId, WorkerProfileId};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Result of a single `sendToWorker` round-trip, as seen by the
/// runner: the response text plus any non-fatal warning the backend
/// picked up along the way (spec §4.D.3 step 7 / §8 `has_warning`).
/// Defined here rather than reused from `orc-backend` because this
/// crate has no dependency on that crate (see module docs).
pub struct WorkerSendOutcome {
    pub response: String,
    pub warning: Option<String>,
}

/// What a runner needs to actually exercise a worker, kept abstract so
/// this crate never depends on the daemon's worker pool or bridge.
#[async_trait]
pub trait WorkflowHost: Send + Sync {
    /// Make sure the worker exists, spawning it if `auto_spawn` permits
    /// and it isn't already running (spec §4.F step 2, via §4.B
    /// `getOrSpawn`).
    async fn ensure_worker(&self, worker_id: &WorkerProfileId, auto_spawn: bool) -> Result<(), WorkflowError>;

    /// Send a composed prompt to the worker and return its response
    /// text plus any warning (spec §4.F step 4, `sendToWorker`).
    async fn send_to_worker(
        &self,
        worker_id: &WorkerProfileId,
        message: &str,
        timeout: Duration,
    ) -> Result<WorkerSendOutcome, WorkflowError>;

    /// The worker profile's own `requiredSkills`, unioned into the
    /// skill preflight alongside the workflow/step-level skills (spec
    /// §4.F: "the workflow's required skills and each step's worker
    /// profile's required skills"). Host implementations that can
    /// resolve a `workerId` to a profile should override this;
    /// defaults to empty so hosts with no profile registry still
    /// compile.
    fn worker_required_skills(&self, _worker_id: &WorkerProfileId) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Publish an event onto the bus (spec §4.F "Events").
    fn emit(&self, event: OrchestratorEvent);
}

/// Union of the workflow's own declared skills with every step's
/// worker profile's `requiredSkills` (spec §4.F skill preflight).
fn all_required_skills(def: &WorkflowDefinition, host: &dyn WorkflowHost) -> BTreeSet<String> {
    let mut skills = def.required_skills();
    for step in &def.steps {
        skills.extend(host.worker_required_skills(&step.worker_id));
    }
    skills
}

/// Everything `startWorkflow` needs besides the static definition
/// (spec §3 `WorkflowRunState` minus the fields the runner derives).
pub struct StartWorkflowRequest {
    pub task: String,
    pub carry: Option<String>,
    pub attachments: Vec<serde_json::Value>,
    pub auto_spawn: bool,
    pub limits: WorkflowLimits,
    pub ui: WorkflowUi,
    pub parent_session_id: Option<SessionId>,
}

/// Resolves a `WorkflowId` to its static definition. A trait so the
/// daemon can back it with whatever config store it uses; kept
/// separate from [`WorkflowHost`] since it's pure data lookup, not an
/// effectful call to a worker.
pub trait WorkflowCatalog: Send + Sync {
    fn get(&self, id: &orc_core::WorkflowId) -> Option<WorkflowDefinition>;
}

pub struct WorkflowRunner<C: Clock> {
    host: Arc<dyn WorkflowHost>,
    store: PauseStore,
    clock: C,
}

impl<C: Clock> WorkflowRunner<C> {
    pub fn new(host: Arc<dyn WorkflowHost>, store: PauseStore, clock: C) -> Self {
        Self { host, store, clock }
    }

    /// Begin a fresh run (spec §4.F validation + execution loop from
    /// `currentStepIndex = 0`).
    pub async fn start_workflow(
        &self,
        def: &WorkflowDefinition,
        request: StartWorkflowRequest,
        skills: &dyn SkillRegistry,
    ) -> Result<WorkflowRunState, WorkflowError> {
        if request.task.chars().count() > request.limits.max_task_chars {
            return Err(WorkflowError::TaskTooLong {
                len: request.task.chars().count(),
                max: request.limits.max_task_chars,
            });
        }
        if def.steps.len() > request.limits.max_steps {
            return Err(WorkflowError::TooManySteps { len: def.steps.len(), max: request.limits.max_steps });
        }
        validate_skills(&all_required_skills(def, self.host.as_ref()), skills)?;
        let now = self.clock.epoch_ms();
        let state = WorkflowRunState {
            run_id: RunId::new(),
            workflow_id: def.id.clone(),
            workflow_name: def.name.clone(),
            task: request.task.clone(),
            carry: request.carry,
            attachments: request.attachments,
            auto_spawn: request.auto_spawn,
            limits: request.limits,
            ui: request.ui,
            status: WorkflowStatus::Running,
            current_step_index: 0,
            steps: Vec::new(),
            last_step_result: None,
            started_at: now,
            updated_at: now,
            finished_at: None,
            parent_session_id: request.parent_session_id,
        };
        self.host.emit(OrchestratorEvent::new(
            now,
            EventPayload::WorkflowStarted(WorkflowStartedPayload {
                run_id: state.run_id,
                workflow_id: state.workflow_id.clone(),
                workflow_name: state.workflow_name.clone(),
                task: state.task.clone(),
            }),
        ));
        self.run_from(state, def).await
    }

    /// Resume a paused run (spec §4.F "Pause persistence"). Re-runs the
    /// skill preflight: permissions may have changed since the run
    /// paused, and the spec's "fail-fast before step 1" guarantee
    /// should hold for every entry into the loop, not just the first.
    /// `ui_override`, when present, replaces the paused run's UI policy
    /// before resuming — the caller-supplied `continueWorkflow(runId,
    /// {uiPolicy?})` override (spec §4.F / §6.1), e.g. to switch a run
    /// into `execution: "step"` on resume.
    pub async fn continue_workflow(
        &self,
        run_id: &RunId,
        catalog: &dyn WorkflowCatalog,
        skills: &dyn SkillRegistry,
        ui_override: Option<WorkflowUi>,
    ) -> Result<WorkflowRunState, WorkflowError> {
        let mut state = self
            .store
            .load(run_id)?
            .ok_or_else(|| WorkflowError::UnknownRun { run_id: run_id.as_str().to_string() })?;
        let def = catalog
            .get(&state.workflow_id)
            .ok_or_else(|| WorkflowError::UnknownWorkflow { workflow_id: state.workflow_id.as_str().to_string() })?;
        validate_skills(&all_required_skills(&def, self.host.as_ref()), skills)?;
        if let Some(ui) = ui_override {
            state.ui = ui;
        }
        self.run_from(state, &def).await
    }

    async fn run_from(
        &self,
        mut state: WorkflowRunState,
        def: &WorkflowDefinition,
    ) -> Result<WorkflowRunState, WorkflowError> {
        while state.current_step_index < def.steps.len() {
            let step = def
                .steps
                .get(state.current_step_index)
                .ok_or_else(|| WorkflowError::UnknownWorkerProfile { worker_id: String::new() })?;

            self.host.ensure_worker(&step.worker_id, state.auto_spawn).await?;

            let prompt = compose_step_prompt(&step.prompt, &state.task, state.carry.as_deref(), &state.steps);
            let timeout = step_timeout(step.timeout_ms, state.limits.per_step_timeout_ms);

            let started_at = self.clock.epoch_ms();
            let outcome = self.host.send_to_worker(&step.worker_id, &prompt, timeout).await;
            let finished_at = self.clock.epoch_ms();

            let (status, response, warning, error) = match outcome {
                Ok(outcome) => (StepStatus::Success, Some(outcome.response), outcome.warning, None),
                Err(e) => (StepStatus::Error, None, None, Some(e.to_string())),
            };
            if step.carry {
                if let Some(text) = &response {
                    state.set_carry(text.clone());
                }
            }

            let result = WorkflowStepResult {
                id: step.id.clone(),
                title: step.title.clone(),
                worker_id: step.worker_id.clone(),
                status,
                response,
                warning,
                error,
                job_id: None,
                started_at,
                finished_at,
                duration_ms: finished_at.saturating_sub(started_at),
            };
            state.push_step(result.clone(), finished_at);
            self.host.emit(OrchestratorEvent::new(
                finished_at,
                EventPayload::WorkflowStep(WorkflowStepPayload { run_id: state.run_id, step: result }),
            ));

            let is_last_step = state.current_step_index + 1 == def.steps.len();
            let has_warning = state.last_step_result.as_ref().and_then(|r| r.warning.as_ref()).is_some();
            match gate::decide(&state.ui, status, has_warning, is_last_step) {
                GateDecision::Continue => {
                    state.current_step_index += 1;
                }
                GateDecision::Pause { reason, retry_current } => {
                    if !retry_current {
                        state.current_step_index += 1;
                    }
                    state.status = WorkflowStatus::Paused;
                    state.updated_at = self.clock.epoch_ms();
                    self.store.save(&state)?;
                    tracing::info!(run_id = %state.run_id, reason, retry_current, "workflow paused");
                    return Ok(state);
                }
                GateDecision::TerminateError => {
                    self.complete(&mut state, WorkflowStatus::Error)?;
                    return Ok(state);
                }
                GateDecision::TerminateSuccess => {
                    self.complete(&mut state, WorkflowStatus::Success)?;
                    return Ok(state);
                }
            }
        }
        // Ran out of steps without hitting a terminal gate decision
        // (an empty workflow, or every step continued past the end).
        self.complete(&mut state, WorkflowStatus::Success)?;
        Ok(state)
    }

    /// Move a run to a terminal state: stamp timestamps, publish
    /// `orchestra.workflow.completed`, and delete its pause record if
    /// one existed (spec §4.F "Pause persistence": "terminal runs are
    /// deleted from the store").
    fn complete(&self, state: &mut WorkflowRunState, status: WorkflowStatus) -> Result<(), WorkflowError> {
        let now = self.clock.epoch_ms();
        state.status = status;
        state.updated_at = now;
        state.finished_at = Some(now);
        tracing::info!(run_id = %state.run_id, %status, "workflow completed");
        self.host.emit(OrchestratorEvent::new(
            now,
            EventPayload::WorkflowCompleted(WorkflowCompletedPayload {
                run_id: state.run_id,
                status: state.status,
                steps: state.steps.clone(),
            }),
        ));
        self.store.delete(&state.run_id)
    }
}

fn step_timeout(step_timeout_ms: Option<u64>, limit_ms: Option<u64>) -> Duration {
    let ms = match (step_timeout_ms, limit_ms) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => u64::MAX,
    };
    Duration::from_millis(ms)
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
