// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_backend::{AssistantMessage, FakeOcServerClient, MessagePart, WorkerShutdown};
use orc_core::{FakeClock, ModelSpec, WorkerInstance, WorkerKind, WorkerProfile, WorkerStatus};
use orc_workflow::SkillPermissionMap;
use std::collections::{BTreeMap, BTreeSet};

fn profile(id: WorkerProfileId, kind: WorkerKind) -> WorkerProfile {
    WorkerProfile {
        id,
        name: "coder".into(),
        purpose: "writes code".into(),
        when_to_use: "general coding tasks".into(),
        model: ModelSpec::Auto,
        kind,
        execution: None,
        supports_vision: false,
        supports_web: false,
        tools: BTreeMap::new(),
        required_skills: BTreeSet::new(),
        temperature: None,
        tags: Default::default(),
        system_prompt: "you are a coder".into(),
        inject_repo_context: false,
        pinned_port: None,
    }
}

fn context() -> Arc<OrchestratorContext<FakeClock>> {
    let config = OrchestratorConfig {
        state_dir: std::env::temp_dir(),
        bridge_bind_addr: default_bridge_bind(),
        spawn_ready_timeout_ms: default_spawn_ready_timeout_ms(),
        prompt_timeout_ms: default_prompt_timeout_ms(),
        workflow_limits: Default::default(),
        ocserve_command: default_ocserve_command(),
        orchestrator_instance_id: "test-instance".into(),
    };
    OrchestratorContext::new(
        config,
        FakeClock::new(),
        WorkerProfileCatalog::default(),
        InMemoryWorkflowCatalog::default(),
        SkillPermissionMap::new(std::iter::empty()),
        ResolverConfig::default(),
        Vec::new(),
        None,
    )
}

#[test]
fn worker_profile_catalog_round_trips_by_id() {
    let catalog = WorkerProfileCatalog::default();
    let id = WorkerProfileId::new();
    catalog.insert(profile(id, WorkerKind::Agent));

    assert!(catalog.get(&id).is_some());
    assert_eq!(catalog.list().len(), 1);
    assert!(catalog.get(&WorkerProfileId::new()).is_none());
}

#[test]
fn in_memory_workflow_catalog_round_trips_by_id() {
    let catalog = InMemoryWorkflowCatalog::default();
    let def = WorkflowDefinition { id: WorkflowId::from("wf-test"), name: "test".into(), steps: Vec::new() };
    catalog.insert(def.clone());

    assert_eq!(WorkflowCatalog::get(&catalog, &def.id).map(|d| d.name), Some("test".to_string()));
    assert!(WorkflowCatalog::get(&catalog, &WorkflowId::from("wf-other")).is_none());
}

#[tokio::test]
async fn new_wires_a_working_bus_and_bridge_token() {
    let ctx = context();
    assert!(!ctx.bridge_token.is_empty());
    assert_eq!(ctx.metrics_snapshot().spawns, 0);
}

// Spec §4.H / §9: `ensureWorker` is a no-op once the pool already has a
// live instance, whether or not `autoSpawn` is set.
#[tokio::test]
async fn ensure_worker_short_circuits_on_an_already_registered_worker() {
    let ctx = context();
    let worker_id = WorkerProfileId::new();
    let instance = WorkerInstance {
        profile_id: worker_id,
        name: "coder".into(),
        status: WorkerStatus::Ready,
        port: None,
        pid: Some(1),
        server_url: None,
        session_id: Some("ses-1".into()),
        parent_session_id: None,
        started_at: 0,
        last_activity: 0,
        current_task: None,
        warning: None,
        error: None,
        last_result: None,
        model_resolution: None,
        kind: WorkerKind::Agent,
        execution: None,
    };
    ctx.pool.register(instance, Arc::new(FakeOcServerClient::default()), WorkerShutdown::Agent);

    WorkflowHost::ensure_worker(ctx.as_ref(), &worker_id, false).await.expect("already live, no spawn needed");
}

// Spec §8 invariant: `autoSpawn=false` against a not-yet-running worker
// must fail rather than spawn one.
#[tokio::test]
async fn ensure_worker_without_auto_spawn_errors_when_not_running() {
    let ctx = context();
    let worker_id = WorkerProfileId::new();
    let err = WorkflowHost::ensure_worker(ctx.as_ref(), &worker_id, false).await.expect_err("not running");
    assert!(matches!(err, WorkflowError::WorkerUnavailable { .. }));
}

#[tokio::test]
async fn ensure_worker_with_auto_spawn_on_an_unknown_profile_errors() {
    let ctx = context();
    let worker_id = WorkerProfileId::new();
    let err = WorkflowHost::ensure_worker(ctx.as_ref(), &worker_id, true).await.expect_err("unknown profile");
    assert!(matches!(err, WorkflowError::UnknownWorkerProfile { .. }));
}

// Spec §4.H `sendToWorker`: the instance stored in the pool reflects the
// prompt round-trip (status back to ready, `last_result` updated) after
// a successful send.
#[tokio::test]
async fn send_to_worker_updates_the_stored_instance_after_a_successful_prompt() {
    let ctx = context();
    let worker_id = WorkerProfileId::new();
    let instance = WorkerInstance {
        profile_id: worker_id,
        name: "coder".into(),
        status: WorkerStatus::Ready,
        port: None,
        pid: Some(1),
        server_url: None,
        session_id: Some("ses-1".into()),
        parent_session_id: None,
        started_at: 0,
        last_activity: 0,
        current_task: None,
        warning: None,
        error: None,
        last_result: None,
        model_resolution: None,
        kind: WorkerKind::Agent,
        execution: None,
    };
    let client = Arc::new(FakeOcServerClient::default());
    client.set_next_message(AssistantMessage { id: "msg-1".into(), parts: vec![MessagePart::Text { text: "done".into() }] });
    ctx.pool.register(instance, client, WorkerShutdown::Agent);

    let reply = WorkflowHost::send_to_worker(ctx.as_ref(), &worker_id, "do the thing", Duration::from_secs(5))
        .await
        .expect("prompt succeeds");
    assert!(reply.response.contains("done"));

    let updated = ctx.pool.get(&worker_id).expect("still registered");
    assert_eq!(updated.status, WorkerStatus::Ready);
    assert_eq!(updated.current_task.as_deref(), Some("do the thing"));
}

// A prompt against an unregistered worker is reported as a backend
// error rather than panicking on the missing pool entry.
#[tokio::test]
async fn send_to_worker_on_an_unregistered_worker_errors() {
    let ctx = context();
    let worker_id = WorkerProfileId::new();
    let err = WorkflowHost::send_to_worker(ctx.as_ref(), &worker_id, "hi", Duration::from_secs(5))
        .await
        .expect_err("not registered");
    assert!(matches!(err, WorkflowError::Backend(_)));
}
