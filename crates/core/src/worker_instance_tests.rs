use super::*;
use crate::clock::{Clock, FakeClock};
use crate::worker_profile::WorkerKind;

fn base(kind: WorkerKind, status: WorkerStatus) -> WorkerInstance {
    WorkerInstance {
        profile_id: WorkerProfileId::from_string("wkp-coder"),
        name: "coder".to_string(),
        status,
        port: None,
        pid: None,
        server_url: None,
        session_id: None,
        parent_session_id: None,
        started_at: 0,
        last_activity: 0,
        current_task: None,
        warning: None,
        error: None,
        last_result: None,
        model_resolution: None,
        kind,
        execution: None,
    }
}

#[test]
fn ready_without_session_is_invalid() {
    let instance = base(WorkerKind::Agent, WorkerStatus::Ready);
    assert!(matches!(
        instance.validate(),
        Err(WorkerInstanceError::MissingSession { .. })
    ));
}

#[test]
fn ready_agent_with_session_is_valid() {
    let mut instance = base(WorkerKind::Agent, WorkerStatus::Ready);
    instance.session_id = Some("sess-1".to_string());
    assert!(instance.validate().is_ok());
}

#[test]
fn server_without_pid_is_invalid_unless_stopped() {
    let mut instance = base(WorkerKind::Server, WorkerStatus::Starting);
    assert!(matches!(instance.validate(), Err(WorkerInstanceError::MissingPid)));
    instance.status = WorkerStatus::Stopped;
    assert!(instance.validate().is_ok());
}

#[test]
fn subagent_requires_parent_session() {
    let mut instance = base(WorkerKind::Subagent, WorkerStatus::Starting);
    assert!(matches!(
        instance.validate(),
        Err(WorkerInstanceError::MissingParentSession)
    ));
    instance.parent_session_id = Some(SessionId::new("sess-parent"));
    assert!(instance.validate().is_ok());
}

#[test]
fn touch_updates_last_activity_from_clock() {
    let clock = FakeClock::new();
    let mut instance = base(WorkerKind::Agent, WorkerStatus::Starting);
    clock.advance(std::time::Duration::from_millis(500));
    instance.touch(&clock);
    assert_eq!(instance.last_activity, clock.epoch_ms());
}

#[test]
fn was_reused_checks_model_resolution_prefix() {
    let mut instance = base(WorkerKind::Agent, WorkerStatus::Starting);
    instance.model_resolution = Some("reused existing worker".to_string());
    assert!(instance.was_reused());
    instance.model_resolution = Some("auto-selected from configured models".to_string());
    assert!(!instance.was_reused());
}
