// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::liveness::Liveness;
use orc_core::WorkerProfileId;
use orc_wire::DeviceRegistryEntry;
use std::collections::HashSet;

struct FakeLiveness(HashSet<u32>);

impl Liveness for FakeLiveness {
    fn is_alive(&self, pid: u32) -> bool {
        self.0.contains(&pid)
    }
}

fn worker_entry(pid: u32, worker_id: &str, updated_at: u64) -> DeviceRegistryEntry {
    DeviceRegistryEntry::Worker {
        orchestrator_instance_id: "orch-a".into(),
        host_pid: 1,
        worker_id: WorkerProfileId::from_string(worker_id),
        pid,
        url: Some("http://127.0.0.1:1".into()),
        port: Some(1),
        session_id: None,
        status: orc_core::WorkerStatus::Ready,
        started_at: 0,
        updated_at,
        last_error: None,
    }
}

#[test]
fn upsert_then_list_returns_equivalent_entry() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DeviceRegistry::new(dir.path().join("registry.json"));
    let live = FakeLiveness([100].into_iter().collect());

    registry.upsert_worker(&live, worker_entry(100, "wkp-coder", 10)).unwrap();
    let entries = registry.list_entries(&live);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].liveness_pid(), 100);
}

#[test]
fn list_entries_prunes_dead_pids() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DeviceRegistry::new(dir.path().join("registry.json"));
    let alive = FakeLiveness([100].into_iter().collect());
    registry.upsert_worker(&alive, worker_entry(100, "wkp-coder", 10)).unwrap();
    registry.upsert_worker(&alive, worker_entry(200, "wkp-reviewer", 20)).unwrap();

    let now_dead = FakeLiveness([100].into_iter().collect());
    let entries = registry.list_entries(&now_dead);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].liveness_pid(), 100);
}

#[test]
fn upsert_replaces_same_key_not_append() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DeviceRegistry::new(dir.path().join("registry.json"));
    let live = FakeLiveness([100].into_iter().collect());
    registry.upsert_worker(&live, worker_entry(100, "wkp-coder", 10)).unwrap();
    registry.upsert_worker(&live, worker_entry(100, "wkp-coder", 20)).unwrap();

    let entries = registry.list_entries(&live);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].updated_at(), 20);
}

#[test]
fn entries_for_worker_sorted_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DeviceRegistry::new(dir.path().join("registry.json"));
    let live = FakeLiveness([100, 200].into_iter().collect());
    registry.upsert_worker(&live, worker_entry(100, "wkp-coder", 10)).unwrap();
    registry.upsert_worker(&live, worker_entry(200, "wkp-coder", 30)).unwrap();

    let entries = registry.entries_for_worker(&live, &WorkerProfileId::from_string("wkp-coder"));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].updated_at(), 30);
}

#[test]
fn remove_by_pid_drops_matching_entries() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DeviceRegistry::new(dir.path().join("registry.json"));
    let live = FakeLiveness([100].into_iter().collect());
    registry.upsert_worker(&live, worker_entry(100, "wkp-coder", 10)).unwrap();
    registry.remove_by_pid(&live, 100).unwrap();
    assert!(registry.list_entries(&live).is_empty());
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DeviceRegistry::new(dir.path().join("missing.json"));
    let live = FakeLiveness(HashSet::new());
    assert!(registry.list_entries(&live).is_empty());
}

#[test]
fn corrupt_file_reads_as_empty_rather_than_panicking() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");
    std::fs::write(&path, b"not json").unwrap();
    let registry = DeviceRegistry::new(path);
    let live = FakeLiveness(HashSet::new());
    assert!(registry.list_entries(&live).is_empty());
}
