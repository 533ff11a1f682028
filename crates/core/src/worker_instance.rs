// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live worker state (spec §3 `WorkerInstance`).

use crate::clock::Clock;
use crate::ids::{JobId, SessionId, WorkerProfileId};
use crate::worker_profile::{ExecutionMode, WorkerKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of worker lifecycle states (spec §3, §9 "enumerate as a
/// closed sum type"). Only the Worker Pool mutates this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Starting,
    Ready,
    Busy,
    Error,
    Stopped,
}

crate::simple_display! {
    WorkerStatus {
        Starting => "starting",
        Ready => "ready",
        Busy => "busy",
        Error => "error",
        Stopped => "stopped",
    }
}

impl WorkerStatus {
    /// `true` for states where `client`/`sessionId` must be present
    /// (spec §3 invariant: `status ∈ {ready, busy} ⇒ client ≠ null`).
    pub fn requires_live_session(self) -> bool {
        matches!(self, WorkerStatus::Ready | WorkerStatus::Busy)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerStatus::Stopped)
    }
}

/// Record of the most recently completed job this worker served.
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastResult {
    pub at: u64,
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<serde_json::Value>,
    pub duration_ms: u64,
}

/// Live state of a spawned worker, built atop an immutable
/// [`crate::WorkerProfile`].
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInstance {
    pub profile_id: WorkerProfileId,
    pub name: String,
    pub status: WorkerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<SessionId>,
    pub started_at: u64,
    pub last_activity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<LastResult>,
    /// Human-readable reason the Model Resolver produced the model bound
    /// to this worker (e.g. `"reused existing worker"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_resolution: Option<String>,
    pub kind: WorkerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionMode>,
}

/// Error constructing/validating a [`WorkerInstance`] against spec §3's
/// invariants.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkerInstanceError {
    #[error("status {status} requires a live session but session_id is unset")]
    MissingSession { status: WorkerStatus },
    #[error("kind=server requires a pid but none was set")]
    MissingPid,
    #[error("kind=subagent requires a parent_session_id but none was set")]
    MissingParentSession,
}

impl WorkerInstance {
    /// Validate the structural invariants spec §3 lists for
    /// `WorkerInstance`. Called whenever the Worker Pool transitions a
    /// worker's status.
    pub fn validate(&self) -> Result<(), WorkerInstanceError> {
        if self.status.requires_live_session() && self.session_id.is_none() {
            return Err(WorkerInstanceError::MissingSession { status: self.status });
        }
        if self.kind == WorkerKind::Server && self.pid.is_none() && !self.status.is_terminal() {
            return Err(WorkerInstanceError::MissingPid);
        }
        if self.kind == WorkerKind::Subagent && self.parent_session_id.is_none() {
            return Err(WorkerInstanceError::MissingParentSession);
        }
        Ok(())
    }

    pub fn touch(&mut self, clock: &impl Clock) {
        self.last_activity = clock.epoch_ms();
    }

    /// `true` if this worker was obtained via Device Registry reuse
    /// rather than a fresh spawn (spec §3 ownership semantics, §8
    /// invariant 7: a reused worker is never owned by the reusing
    /// session).
    pub fn was_reused(&self) -> bool {
        self.model_resolution
            .as_deref()
            .is_some_and(|r| r.starts_with("reused"))
    }
}

impl fmt::Display for WorkerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.name, self.profile_id, self.status)
    }
}

#[cfg(test)]
#[path = "worker_instance_tests.rs"]
mod tests;
