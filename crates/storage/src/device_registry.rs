// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Device Registry (spec §4.A, §6.4): an on-disk, process-shared
//! JSON file letting orchestrator instances on one host reattach to
//! still-alive worker processes and avoid duplicate spawns.
//!
//! Grounded on the teacher's `env::state_dir()` convention for where
//! durable state lives, generalized from a single fixed path to one
//! passed in explicitly (this crate has no CLI/env-parsing concerns of
//! its own — that belongs to the embedding host per spec §1).

use crate::liveness::Liveness;
use crate::RegistryError;
use orc_core::WorkerProfileId;
use orc_wire::{DeviceRegistryEntry, DeviceRegistryFile};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Guards reads/writes of one registry file. Cheap to construct; holds
/// only a path and a mutex serializing writers within this process
/// (cross-process writers still race at the filesystem level, resolved
/// by atomic rename — spec §4.A, §5 "last-writer-wins at the file
/// level").
pub struct DeviceRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DeviceRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, pruning any entry whose backing pid is not alive.
    /// On any I/O or parse error, returns an empty set rather than
    /// failing — spec §4.A: "readers tolerate concurrent writers by
    /// retrying on parse error and returning an empty file on any I/O
    /// error".
    pub fn list_entries(&self, liveness: &dyn Liveness) -> Vec<DeviceRegistryEntry> {
        let file = match self.read_file() {
            Ok(file) => file,
            Err(err) => {
                debug!(error = %err, path = %self.path.display(), "device registry read failed, treating as empty");
                return Vec::new();
            }
        };
        let (live, dead): (Vec<_>, Vec<_>) =
            file.entries.into_iter().partition(|e| liveness.is_alive(e.liveness_pid()));
        if !dead.is_empty() {
            if let Err(err) = self.write_entries(live.clone()) {
                warn!(error = %err, "failed to persist pruned device registry");
            }
        }
        live
    }

    /// Replace the unique worker entry keyed by
    /// `(orchestratorInstanceId, workerId, pid)` with `entry`, or insert
    /// it if absent.
    pub fn upsert_worker(
        &self,
        liveness: &dyn Liveness,
        entry: DeviceRegistryEntry,
    ) -> Result<(), RegistryError> {
        debug_assert!(matches!(entry, DeviceRegistryEntry::Worker { .. }));
        let key = entry_key(&entry);
        self.upsert(liveness, entry, key)
    }

    /// Replace the unique session entry keyed by `(hostPid, sessionId)`.
    pub fn upsert_session(
        &self,
        liveness: &dyn Liveness,
        entry: DeviceRegistryEntry,
    ) -> Result<(), RegistryError> {
        debug_assert!(matches!(entry, DeviceRegistryEntry::Session { .. }));
        let key = entry_key(&entry);
        self.upsert(liveness, entry, key)
    }

    fn upsert(
        &self,
        liveness: &dyn Liveness,
        entry: DeviceRegistryEntry,
        key: EntryKey,
    ) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.list_entries(liveness);
        entries.retain(|e| entry_key(e) != key);
        entries.push(entry);
        self.write_entries(entries)
    }

    /// Remove every worker entry backed by `pid` (spec §4.A `removeByPid`).
    pub fn remove_by_pid(&self, liveness: &dyn Liveness, pid: u32) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.list_entries(liveness);
        entries.retain(|e| e.liveness_pid() != pid);
        self.write_entries(entries)
    }

    /// Remove the session entry for `(session_id, host_pid)`.
    pub fn remove_session(
        &self,
        liveness: &dyn Liveness,
        session_id: &str,
        host_pid: u32,
    ) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.list_entries(liveness);
        entries.retain(|e| {
            !matches!(e, DeviceRegistryEntry::Session { host_pid: hp, session_id: sid, .. }
                if *hp == host_pid && sid.as_str() == session_id)
        });
        self.write_entries(entries)
    }

    /// Entries for a given worker profile id, newest-updated first —
    /// the candidate list spec §4.B reuse step 1–2 sorts and filters.
    pub fn entries_for_worker(
        &self,
        liveness: &dyn Liveness,
        worker_id: &WorkerProfileId,
    ) -> Vec<DeviceRegistryEntry> {
        let mut entries: Vec<_> = self
            .list_entries(liveness)
            .into_iter()
            .filter(|e| e.worker_id().map(|w| w == worker_id).unwrap_or(false))
            .collect();
        entries.sort_by_key(|e| std::cmp::Reverse(e.updated_at()));
        entries
    }

    fn read_file(&self) -> Result<DeviceRegistryFile, RegistryError> {
        if !self.path.exists() {
            return Ok(DeviceRegistryFile::empty(0));
        }
        let bytes = std::fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write `entries` to the registry file atomically: write to a
    /// sibling tmp path, then rename over the target (spec §4.A).
    fn write_entries(&self, entries: Vec<DeviceRegistryEntry>) -> Result<(), RegistryError> {
        let updated_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let file = DeviceRegistryFile { version: orc_wire::REGISTRY_SCHEMA_VERSION, updated_at, entries };
        let bytes = serde_json::to_vec_pretty(&file)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum EntryKey {
    Worker { orchestrator_instance_id: String, worker_id: String, pid: u32 },
    Session { host_pid: u32, session_id: String },
}

fn entry_key(entry: &DeviceRegistryEntry) -> EntryKey {
    match entry {
        DeviceRegistryEntry::Worker { orchestrator_instance_id, worker_id, pid, .. } => {
            EntryKey::Worker {
                orchestrator_instance_id: orchestrator_instance_id.clone(),
                worker_id: worker_id.as_str().to_string(),
                pid: *pid,
            }
        }
        DeviceRegistryEntry::Session { host_pid, session_id, .. } => {
            EntryKey::Session { host_pid: *host_pid, session_id: session_id.as_str().to_string() }
        }
    }
}

#[cfg(test)]
#[path = "device_registry_tests.rs"]
mod tests;
