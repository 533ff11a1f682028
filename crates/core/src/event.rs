// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator's versioned event union (spec §4.G, §6.3).
//!
//! Grounded on the teacher's own event enum (`crates/core/src/event/
//! mod.rs`): one Rust enum, one variant per wire event type, dispatched
//! by a `type` tag. Differs from the teacher in one deliberate way —
//! the teacher's catch-all (`#[serde(other)] Custom`) discards the
//! original tag and payload on an unrecognized type; spec §6.3 instead
//! requires consumers to tolerate (not silently drop) unknown types, so
//! this implementation keeps both the original tag and the raw JSON
//! payload in [`EventPayload::Unknown`]. That isn't expressible with a
//! single-pass `#[serde(tag = "type")]` derive (the derive has no way to
//! capture "the rest of the object" alongside the tag once a variant
//! fails to match), so [`OrchestratorEvent`] implements `Deserialize` by
//! hand: decode the envelope generically first, then dispatch `data` by
//! the `type` string.

use crate::ids::{EventId, JobId, RunId, WorkerProfileId, WorkflowId};
use crate::worker_instance::{WorkerInstance, WorkerStatus};
use crate::workflow::{WorkflowStatus, WorkflowStepResult};
use serde::{Deserialize, Serialize};

pub const EVENT_VERSION: u32 = 1;

// -- worker --

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatusPayload {
    pub worker: WorkerInstance,
    pub status: WorkerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<WorkerStatus>,
    pub reason: String,
}

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStreamPayload {
    pub worker_id: WorkerProfileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub chunk: String,
    #[serde(default)]
    pub r#final: bool,
}

// -- workflow --

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStartedPayload {
    pub run_id: RunId,
    pub workflow_id: WorkflowId,
    pub workflow_name: String,
    pub task: String,
}

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStepPayload {
    pub run_id: RunId,
    pub step: WorkflowStepResult,
}

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowCompletedPayload {
    pub run_id: RunId,
    pub status: WorkflowStatus,
    pub steps: Vec<WorkflowStepResult>,
}

// -- memory --

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryWrittenPayload {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// -- skill --

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillLoadStartedPayload {
    pub skill: String,
}

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillLoadCompletedPayload {
    pub skill: String,
}

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillLoadFailedPayload {
    pub skill: String,
    pub error: String,
}

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillPermissionPayload {
    pub skill: String,
    pub granted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// -- system --

#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub scope: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerProfileId>,
}

/// The closed set of orchestrator event payloads, plus an `Unknown`
/// escape hatch that retains the original tag and raw JSON (see module
/// docs). Consumers MUST tolerate `Unknown` and unknown fields on known
/// variants (spec §6.3).
#[derive(Debug, Clone)]
pub enum EventPayload {
    WorkerStatus(WorkerStatusPayload),
    WorkerStream(WorkerStreamPayload),
    WorkflowStarted(WorkflowStartedPayload),
    WorkflowStep(WorkflowStepPayload),
    WorkflowCompleted(WorkflowCompletedPayload),
    MemoryWritten(MemoryWrittenPayload),
    SkillLoadStarted(SkillLoadStartedPayload),
    SkillLoadCompleted(SkillLoadCompletedPayload),
    SkillLoadFailed(SkillLoadFailedPayload),
    SkillPermission(SkillPermissionPayload),
    Error(ErrorPayload),
    /// An event type this build doesn't recognize. The tag and raw
    /// payload are preserved rather than dropped.
    Unknown { type_name: String, raw: serde_json::Value },
}

impl EventPayload {
    pub fn type_name(&self) -> &str {
        match self {
            EventPayload::WorkerStatus(_) => "orchestra.worker.status",
            EventPayload::WorkerStream(_) => "orchestra.worker.stream",
            EventPayload::WorkflowStarted(_) => "orchestra.workflow.started",
            EventPayload::WorkflowStep(_) => "orchestra.workflow.step",
            EventPayload::WorkflowCompleted(_) => "orchestra.workflow.completed",
            EventPayload::MemoryWritten(_) => "orchestra.memory.written",
            EventPayload::SkillLoadStarted(_) => "orchestra.skill.load.started",
            EventPayload::SkillLoadCompleted(_) => "orchestra.skill.load.completed",
            EventPayload::SkillLoadFailed(_) => "orchestra.skill.load.failed",
            EventPayload::SkillPermission(_) => "orchestra.skill.permission",
            EventPayload::Error(_) => "orchestra.error",
            EventPayload::Unknown { type_name, .. } => type_name,
        }
    }
}

/// A versioned orchestrator event (spec §3, §6.3).
#[derive(Debug, Clone)]
pub struct OrchestratorEvent {
    pub version: u32,
    pub id: EventId,
    pub timestamp: u64,
    pub payload: EventPayload,
}

impl OrchestratorEvent {
    pub fn new(timestamp: u64, payload: EventPayload) -> Self {
        Self { version: EVENT_VERSION, id: EventId::new(), timestamp, payload }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    id: EventId,
    r#type: String,
    timestamp: u64,
    data: T,
}

impl Serialize for OrchestratorEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::Error;
        let data = match &self.payload {
            EventPayload::WorkerStatus(p) => serde_json::to_value(p),
            EventPayload::WorkerStream(p) => serde_json::to_value(p),
            EventPayload::WorkflowStarted(p) => serde_json::to_value(p),
            EventPayload::WorkflowStep(p) => serde_json::to_value(p),
            EventPayload::WorkflowCompleted(p) => serde_json::to_value(p),
            EventPayload::MemoryWritten(p) => serde_json::to_value(p),
            EventPayload::SkillLoadStarted(p) => serde_json::to_value(p),
            EventPayload::SkillLoadCompleted(p) => serde_json::to_value(p),
            EventPayload::SkillLoadFailed(p) => serde_json::to_value(p),
            EventPayload::SkillPermission(p) => serde_json::to_value(p),
            EventPayload::Error(p) => serde_json::to_value(p),
            EventPayload::Unknown { raw, .. } => Ok(raw.clone()),
        }
        .map_err(S::Error::custom)?;
        Envelope {
            version: self.version,
            id: self.id,
            r#type: self.payload.type_name().to_string(),
            timestamp: self.timestamp,
            data,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OrchestratorEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let envelope = Envelope::<serde_json::Value>::deserialize(deserializer)?;
        let payload = dispatch_payload(&envelope.r#type, envelope.data).map_err(D::Error::custom)?;
        Ok(OrchestratorEvent {
            version: envelope.version,
            id: envelope.id,
            timestamp: envelope.timestamp,
            payload,
        })
    }
}

fn dispatch_payload(type_name: &str, data: serde_json::Value) -> Result<EventPayload, serde_json::Error> {
    Ok(match type_name {
        "orchestra.worker.status" => EventPayload::WorkerStatus(serde_json::from_value(data)?),
        "orchestra.worker.stream" => EventPayload::WorkerStream(serde_json::from_value(data)?),
        "orchestra.workflow.started" => EventPayload::WorkflowStarted(serde_json::from_value(data)?),
        "orchestra.workflow.step" => EventPayload::WorkflowStep(serde_json::from_value(data)?),
        "orchestra.workflow.completed" => EventPayload::WorkflowCompleted(serde_json::from_value(data)?),
        "orchestra.memory.written" => EventPayload::MemoryWritten(serde_json::from_value(data)?),
        "orchestra.skill.load.started" => EventPayload::SkillLoadStarted(serde_json::from_value(data)?),
        "orchestra.skill.load.completed" => EventPayload::SkillLoadCompleted(serde_json::from_value(data)?),
        "orchestra.skill.load.failed" => EventPayload::SkillLoadFailed(serde_json::from_value(data)?),
        "orchestra.skill.permission" => EventPayload::SkillPermission(serde_json::from_value(data)?),
        "orchestra.error" => EventPayload::Error(serde_json::from_value(data)?),
        other => EventPayload::Unknown { type_name: other.to_string(), raw: data },
    })
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
