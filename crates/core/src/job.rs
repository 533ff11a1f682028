// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fire-and-forget task registry entry (spec §3 `Job`, §4.E).
//!
//! Not to be confused with a workflow run ([`crate::WorkflowRunState`]):
//! this is the unit `task_start`/`task_await` operate on.

use crate::ids::{JobId, JobTarget, SessionId};
use serde::{Deserialize, Serialize};

/// Closed set of job states. `Running` is the only non-terminal state;
/// every terminal state is absorbing (spec §3, §8 invariant 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
    Canceled,
}

crate::simple_display! {
    JobStatus {
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Canceled => "canceled",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Free-form structured notes a worker/workflow attaches to a job,
/// mergeable onto an already-terminal job (spec §4.E `attachReport`).
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl JobReport {
    /// Merge in fields present on `other`, leaving existing fields in
    /// place where `other` doesn't set them. Vec fields are appended.
    pub fn merge(&mut self, other: JobReport) {
        if other.summary.is_some() {
            self.summary = other.summary;
        }
        if other.details.is_some() {
            self.details = other.details;
        }
        self.issues.extend(other.issues);
        self.notes.extend(other.notes);
    }
}

/// A unit of work submitted via `task_start` (spec §3, §6.1).
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub target: JobTarget,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    pub status: JobStatus,
    pub started_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub report: JobReport,
}

/// Attempted an illegal transition on a [`Job`] that is already
/// terminal. Per spec §4.E, these attempts are silently ignored by
/// callers, not propagated as hard failures — this type exists so
/// callers can choose to log it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("job {job_id} is already terminal ({status}); transition ignored")]
pub struct AlreadyTerminal {
    pub job_id: JobId,
    pub status: JobStatus,
}

impl Job {
    pub fn new(target: JobTarget, message: impl Into<String>, started_at: u64) -> Self {
        Self {
            id: JobId::new(),
            target,
            message: message.into(),
            session_id: None,
            requested_by: None,
            status: JobStatus::Running,
            started_at,
            finished_at: None,
            duration_ms: None,
            response_text: None,
            error: None,
            report: JobReport::default(),
        }
    }

    fn finish(&mut self, finished_at: u64, status: JobStatus) -> Result<(), AlreadyTerminal> {
        if self.status.is_terminal() {
            return Err(AlreadyTerminal { job_id: self.id, status: self.status });
        }
        self.status = status;
        self.finished_at = Some(finished_at);
        self.duration_ms = Some(finished_at.saturating_sub(self.started_at));
        Ok(())
    }

    pub fn set_result(&mut self, finished_at: u64, response_text: String) -> Result<(), AlreadyTerminal> {
        self.finish(finished_at, JobStatus::Succeeded)?;
        self.response_text = Some(response_text);
        Ok(())
    }

    pub fn set_error(&mut self, finished_at: u64, error: String) -> Result<(), AlreadyTerminal> {
        self.finish(finished_at, JobStatus::Failed)?;
        self.error = Some(error);
        Ok(())
    }

    pub fn cancel(&mut self, finished_at: u64, reason: Option<String>) -> Result<(), AlreadyTerminal> {
        self.finish(finished_at, JobStatus::Canceled)?;
        if let Some(reason) = reason {
            self.error = Some(reason);
        }
        Ok(())
    }

    pub fn attach_report(&mut self, report: JobReport) {
        self.report.merge(report);
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
