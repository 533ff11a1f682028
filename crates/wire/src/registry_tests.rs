// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::WorkerProfileId;

fn sample_worker() -> DeviceRegistryEntry {
    DeviceRegistryEntry::Worker {
        orchestrator_instance_id: "orch-a".into(),
        host_pid: 111,
        worker_id: WorkerProfileId::from_string("wkp-coder"),
        pid: 222,
        url: Some("http://127.0.0.1:4096".into()),
        port: Some(4096),
        session_id: Some("ses_abc".into()),
        status: orc_core::WorkerStatus::Ready,
        started_at: 1000,
        updated_at: 2000,
        last_error: None,
    }
}

#[test]
fn worker_entry_round_trips_and_tags_kind() {
    let entry = sample_worker();
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["kind"], "worker");
    assert_eq!(json["workerId"], "wkp-coder");
    let back: DeviceRegistryEntry = serde_json::from_value(json).unwrap();
    assert_eq!(back.liveness_pid(), 222);
}

#[test]
fn session_entry_liveness_pid_is_host_pid() {
    let entry = DeviceRegistryEntry::Session {
        host_pid: 99,
        session_id: orc_core::SessionId::new("ses_x"),
        directory: "/tmp/proj".into(),
        title: None,
        created_at: 1,
        updated_at: 2,
    };
    assert_eq!(entry.liveness_pid(), 99);
    assert!(entry.worker_id().is_none());
}

#[test]
fn file_schema_round_trips() {
    let file = DeviceRegistryFile { version: 1, updated_at: 5000, entries: vec![sample_worker()] };
    let json = serde_json::to_string(&file).unwrap();
    let back: DeviceRegistryFile = serde_json::from_str(&json).unwrap();
    assert_eq!(back.entries.len(), 1);
    assert_eq!(back.updated_at, 5000);
}
