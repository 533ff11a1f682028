// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device Registry on-disk schema (spec §3 `DeviceRegistryEntry`, §4.A, §6.4).

use orc_core::{SessionId, WorkerProfileId, WorkerStatus};
use serde::{Deserialize, Serialize};

pub const REGISTRY_SCHEMA_VERSION: u32 = 1;

/// One entry in the device-wide registry file: either a live worker or a
/// host session, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeviceRegistryEntry {
    #[serde(rename_all = "camelCase")]
    Worker {
        orchestrator_instance_id: String,
        host_pid: u32,
        worker_id: WorkerProfileId,
        pid: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        status: WorkerStatus,
        started_at: u64,
        updated_at: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_error: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Session {
        host_pid: u32,
        session_id: SessionId,
        directory: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        created_at: u64,
        updated_at: u64,
    },
}

impl DeviceRegistryEntry {
    /// The backing process id this entry's liveness is judged against
    /// (worker `pid`, session `hostPid`) — spec §4.A dead-entry rule.
    pub fn liveness_pid(&self) -> u32 {
        match self {
            DeviceRegistryEntry::Worker { pid, .. } => *pid,
            DeviceRegistryEntry::Session { host_pid, .. } => *host_pid,
        }
    }

    pub fn worker_id(&self) -> Option<&WorkerProfileId> {
        match self {
            DeviceRegistryEntry::Worker { worker_id, .. } => Some(worker_id),
            DeviceRegistryEntry::Session { .. } => None,
        }
    }

    pub fn updated_at(&self) -> u64 {
        match self {
            DeviceRegistryEntry::Worker { updated_at, .. } => *updated_at,
            DeviceRegistryEntry::Session { updated_at, .. } => *updated_at,
        }
    }
}

/// The full registry file contents (spec §6.4: `{version, updatedAt, entries}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRegistryFile {
    pub version: u32,
    pub updated_at: u64,
    pub entries: Vec<DeviceRegistryEntry>,
}

impl DeviceRegistryFile {
    pub fn empty(updated_at: u64) -> Self {
        Self { version: REGISTRY_SCHEMA_VERSION, updated_at, entries: Vec::new() }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
