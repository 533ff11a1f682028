// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge HTTP request/response bodies (spec §4.G, §6.3, §8 scenario S6).

use orc_core::{JobId, WorkerProfileId};
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/stream/chunk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunkRequest {
    pub worker_id: WorkerProfileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub chunk: String,
    #[serde(default)]
    pub r#final: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunkResponse {
    pub ok: bool,
    pub timestamp: u64,
}

/// The SSE data payload on `/v1/stream`, one per emitted chunk (spec §8 S6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunkEvent {
    pub worker_id: WorkerProfileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub chunk: String,
    #[serde(default)]
    pub r#final: bool,
    pub timestamp: u64,
}

/// Body of `POST /v1/events`: a worker-originated event normalized and
/// republished by the bridge (spec §4.G). Carries a raw `type`/`data`
/// pair; the bridge fills in `worker.id`/workflow context when absent
/// and hands it to `orc_core::event::dispatch` for typed parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEventRequest {
    pub r#type: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerProfileId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Uniform JSON error body for non-2xx bridge responses (spec §7 `BridgeError`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
