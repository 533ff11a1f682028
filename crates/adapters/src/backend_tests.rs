// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::client::fake::FakeOcServerClient;
use orc_core::{FakeClock, ModelSpec, SessionId, WorkerKind, WorkerProfileId, WorkerStatus};
use std::sync::atomic::AtomicU64;

fn profile(kind: WorkerKind) -> WorkerProfile {
    WorkerProfile {
        id: WorkerProfileId::from_string("wkp-test"),
        name: "tester".into(),
        purpose: "testing".into(),
        when_to_use: "always".into(),
        model: ModelSpec::parse("node:fast"),
        kind,
        execution: None,
        supports_vision: false,
        supports_web: false,
        tools: Default::default(),
        required_skills: Default::default(),
        temperature: None,
        tags: Default::default(),
        system_prompt: "you are a test worker".into(),
        inject_repo_context: false,
        pinned_port: None,
    }
}

#[tokio::test]
async fn spawn_agent_creates_a_fresh_session_and_sends_bootstrap() {
    let client: Arc<dyn OcServerClient> = Arc::new(FakeOcServerClient::default());
    let clock = FakeClock::new();
    let spawned = spawn_agent(&profile(WorkerKind::Agent), "opencode/gpt-5-nano".into(), client.clone(), None, &clock).await.unwrap();

    assert_eq!(spawned.instance.status, WorkerStatus::Ready);
    assert_eq!(spawned.instance.session_id.as_deref(), Some("ses-0"));
    assert!(matches!(spawned.shutdown, WorkerShutdown::Agent));
    // bootstrap shutdown is a no-op for agent-kind workers
    spawned.shutdown.run().await.unwrap();
}

#[tokio::test]
async fn spawn_agent_subagent_forks_the_parent_session() {
    let client: Arc<dyn OcServerClient> = Arc::new(FakeOcServerClient::default());
    let clock = FakeClock::new();
    let parent = SessionId::new("ses-parent");
    let spawned = spawn_agent(&profile(WorkerKind::Subagent), "opencode/gpt-5-nano".into(), client.clone(), Some(parent.clone()), &clock).await.unwrap();

    assert_eq!(spawned.instance.session_id.as_deref(), Some("ses-parent-fork"));
    assert_eq!(spawned.instance.parent_session_id, Some(parent));
}

#[tokio::test]
async fn spawn_agent_subagent_without_parent_errors() {
    let client: Arc<dyn OcServerClient> = Arc::new(FakeOcServerClient::default());
    let clock = FakeClock::new();
    let err = spawn_agent(&profile(WorkerKind::Subagent), "opencode/gpt-5-nano".into(), client, None, &clock).await.unwrap_err();
    assert!(matches!(err, BackendError::SpawnFailed(_)));
}

#[tokio::test]
async fn send_to_worker_rejects_when_not_ready() {
    let client = FakeOcServerClient::default();
    let clock = FakeClock::new();
    let mut instance = spawn_agent(&profile(WorkerKind::Agent), "m".into(), Arc::new(FakeOcServerClient::default()), None, &clock).await.unwrap().instance;
    instance.status = WorkerStatus::Busy;

    let counter = AtomicU64::new(0);
    let req = SendRequest { message: "hi", attachments: vec![], timeout: None, job_id: None, from: "test", base_dir: std::path::Path::new("/tmp") };
    let err = send_to_worker(&mut instance, &client, req, &clock, &counter).await.unwrap_err();
    assert!(matches!(err, BackendError::NotReady { .. }));
}

#[tokio::test]
async fn send_to_worker_round_trips_through_prompt_and_back_to_ready() {
    let client = FakeOcServerClient::default();
    let clock = FakeClock::new();
    let mut instance = spawn_agent(&profile(WorkerKind::Agent), "m".into(), Arc::new(FakeOcServerClient::default()), None, &clock).await.unwrap().instance;

    client.set_next_message(crate::client::AssistantMessage {
        id: "m1".into(),
        parts: vec![crate::client::MessagePart::Text { text: "the answer".into() }],
    });

    let job_id = "11111111-1111-1111-1111-111111111111";
    let counter = AtomicU64::new(0);
    let req = SendRequest { message: "what is it?", attachments: vec![], timeout: None, job_id: Some(job_id), from: "workflow:run-1", base_dir: std::path::Path::new("/tmp") };
    let outcome = send_to_worker(&mut instance, &client, req, &clock, &counter).await.unwrap();

    assert_eq!(outcome.response, "the answer");
    assert!(outcome.warning.is_none());
    assert_eq!(instance.status, WorkerStatus::Ready);
    assert!(client.prompts_sent.lock().last().unwrap().contains("what is it?"));
    assert!(client.prompts_sent.lock().last().unwrap().contains(&format!(r#"id="{job_id}""#)));

    let last_result = instance.last_result.as_ref().expect("last_result populated on success");
    assert_eq!(last_result.response.as_deref(), Some("the answer"));
    assert_eq!(last_result.job_id, orc_core::JobId(orc_core::Uid::from_string(job_id).unwrap()));
}

#[tokio::test]
async fn send_to_worker_returns_to_ready_on_failure_and_records_error() {
    let client = FakeOcServerClient::default();
    let clock = FakeClock::new();
    let mut instance = spawn_agent(&profile(WorkerKind::Agent), "m".into(), Arc::new(FakeOcServerClient::default()), None, &clock).await.unwrap().instance;

    let counter = AtomicU64::new(0);
    let req = SendRequest { message: "hi", attachments: vec![], timeout: None, job_id: None, from: "test", base_dir: std::path::Path::new("/tmp") };
    let err = send_to_worker(&mut instance, &client, req, &clock, &counter).await.unwrap_err();

    assert!(matches!(err, BackendError::Rpc(_)));
    assert_eq!(instance.status, WorkerStatus::Ready);
    assert!(instance.warning.is_some());
}

#[tokio::test]
async fn worker_shutdown_run_is_idempotent_for_server_kind() {
    let done = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let shutdown = WorkerShutdown::Server { pid: 1, done };
    // already marked done, so run() must not attempt to signal pid 1
    shutdown.run().await.unwrap();
}
