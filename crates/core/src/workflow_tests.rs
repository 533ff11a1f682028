use super::*;
use crate::ids::{WorkerProfileId, WorkflowId};

fn sample_run() -> WorkflowRunState {
    WorkflowRunState {
        run_id: RunId::new(),
        workflow_id: WorkflowId::from_string("wfl-review"),
        workflow_name: "review".to_string(),
        task: "review the PR".to_string(),
        carry: None,
        attachments: Vec::new(),
        auto_spawn: true,
        limits: WorkflowLimits { max_carry_chars: 10, ..Default::default() },
        ui: WorkflowUi { execution: ExecutionGate::Auto, intervene: InterveneGate::OnError },
        status: WorkflowStatus::Running,
        current_step_index: 0,
        steps: Vec::new(),
        last_step_result: None,
        started_at: 0,
        updated_at: 0,
        finished_at: None,
        parent_session_id: None,
    }
}

#[test]
fn set_carry_truncates_over_limit_with_marker() {
    let mut run = sample_run();
    run.set_carry("0123456789ABCDEF".to_string());
    let carry = run.carry.unwrap();
    assert!(carry.starts_with("0123456789"));
    assert!(carry.ends_with("(truncated)"));
}

#[test]
fn set_carry_keeps_short_response_untouched() {
    let mut run = sample_run();
    run.set_carry("short".to_string());
    assert_eq!(run.carry.as_deref(), Some("short"));
}

#[test]
fn push_step_updates_last_step_result_and_timestamp() {
    let mut run = sample_run();
    let step = WorkflowStepResult {
        id: "step-1".to_string(),
        title: "first".to_string(),
        worker_id: WorkerProfileId::from_string("wkp-coder"),
        status: StepStatus::Success,
        response: Some("ok".to_string()),
        warning: None,
        error: None,
        job_id: None,
        started_at: 0,
        finished_at: 10,
        duration_ms: 10,
    };
    run.push_step(step.clone(), 10);
    assert_eq!(run.steps.len(), 1);
    assert_eq!(run.last_step_result.unwrap().id, step.id);
    assert_eq!(run.updated_at, 10);
}

#[test]
fn status_persistence_matches_spec_invariant() {
    assert!(WorkflowStatus::Paused.is_persisted());
    assert!(!WorkflowStatus::Running.is_persisted());
    assert!(WorkflowStatus::Success.is_terminal());
    assert!(WorkflowStatus::Error.is_terminal());
    assert!(!WorkflowStatus::Paused.is_terminal());
}
