use super::*;

#[test]
fn worker_profile_id_round_trips_through_json() {
    let id = WorkerProfileId::new();
    let json = serde_json::to_string(&id).unwrap();
    let back: WorkerProfileId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
    assert!(id.as_str().starts_with("wkp-"));
}

#[test]
fn job_id_is_a_uuid() {
    let id = JobId::new();
    let parsed = Uuid::parse_str(&id.to_string());
    assert!(parsed.is_ok());
}

#[test]
fn job_target_round_trips_worker() {
    let target = JobTarget::Worker(WorkerProfileId::new());
    let json = serde_json::to_string(&target).unwrap();
    let back: JobTarget = serde_json::from_str(&json).unwrap();
    assert_eq!(target, back);
}

#[test]
fn job_target_round_trips_workflow_with_prefix() {
    let target = JobTarget::Workflow(RunId::new());
    let display = target.to_string();
    assert!(display.starts_with("workflow:run-"));
    let json = serde_json::to_string(&target).unwrap();
    let back: JobTarget = serde_json::from_str(&json).unwrap();
    assert_eq!(target, back);
}

#[test]
fn session_id_borrows_as_str_for_map_lookup() {
    use std::collections::HashMap;
    let mut map: HashMap<SessionId, u32> = HashMap::new();
    map.insert(SessionId::new("sess-1"), 1);
    assert_eq!(map.get("sess-1"), Some(&1));
}
