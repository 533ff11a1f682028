// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn task_id_selector_accepts_single_or_many() {
    let a = JobId::new().to_string();
    let b = JobId::new().to_string();

    let one: TaskIdSelector = serde_json::from_value(serde_json::json!(a.clone())).unwrap();
    assert_eq!(one.into_vec().len(), 1);

    let many: TaskIdSelector = serde_json::from_value(serde_json::json!([a, b])).unwrap();
    assert_eq!(many.into_vec().len(), 2);
}

#[test]
fn task_start_response_has_fixed_status_and_next() {
    let resp = TaskStartResponse::new(JobId::new(), TaskKind::Worker);
    assert_eq!(resp.status, "running");
    assert_eq!(resp.next, "task_await");
}

#[test]
fn task_start_request_defaults_kind_to_none_meaning_auto_detect() {
    let req: TaskStartRequest = serde_json::from_value(serde_json::json!({"task": "do it"})).unwrap();
    assert!(req.kind.is_none());
    assert!(!req.auto_spawn);
}

#[test]
fn task_list_request_defaults_to_none_view_and_format() {
    let req: TaskListRequest = serde_json::from_value(serde_json::json!({})).unwrap();
    assert!(req.view.is_none());
    assert!(req.format.is_none());
    assert!(req.worker_id.is_none());
}

#[test]
fn task_cancel_request_accepts_a_single_id_and_reason() {
    let id = JobId::new().to_string();
    let req: TaskCancelRequest = serde_json::from_value(serde_json::json!({"ids": id, "reason": "stale"})).unwrap();
    assert_eq!(req.ids.into_vec().len(), 1);
    assert_eq!(req.reason.as_deref(), Some("stale"));
}
