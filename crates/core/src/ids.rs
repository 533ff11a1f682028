// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types for the orchestrator's data model.
//!
//! Two id styles are used, matching the two styles already present in
//! the codebase this was built from: most domain ids are a short
//! type-prefixed nanoid generated via [`crate::define_id`] (`IdBuf`-backed,
//! `Copy`, fits in a `HashMap` key by `Borrow<str>`). The two ids spec'd
//! as UUIDs (`Job.id`, `OrchestratorEvent.id`) wrap [`uuid::Uuid`] directly
//! instead, since a 23-byte inline buffer can't hold a UUID's canonical
//! 36-character form.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

crate::define_id! {
    /// Identifies a [`crate::WorkerProfile`] and, transitively, the
    /// [`crate::WorkerInstance`] spawned from it (the pool keys workers by
    /// profile id).
    pub struct WorkerProfileId("wkp-");
}

crate::define_id! {
    /// Identifies a workflow definition.
    pub struct WorkflowId("wfl-");
}

crate::define_id! {
    /// Identifies a single workflow run (`WorkflowRunState.runId`).
    pub struct RunId("run-");
}

crate::define_id! {
    /// Identifies one step within a workflow run.
    pub struct StepId("stp-");
}

/// A host-supplied session identifier. Opaque to the orchestrator: it
/// never generates these itself, only tracks ownership against them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// UUIDv4 id. Used only where spec text mandates a UUID (`Job.id`,
/// `OrchestratorEvent.id`) rather than a prefixed nanoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(pub Uuid);

impl Uid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: impl AsRef<str>) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.as_ref())?))
    }
}

impl Default for Uid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a [`crate::Job`] (the fire-and-forget task registry entry).
/// Spec §3 mandates a UUID here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uid);

impl JobId {
    pub fn new() -> Self {
        Self(Uid::new())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies an [`crate::OrchestratorEvent`]. Spec §3 mandates a UUID here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uid);

impl EventId {
    pub fn new() -> Self {
        Self(Uid::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A target a `Job`/workflow step runs against: either a standalone
/// worker, or a workflow run (spec's `workflow:<id>` convention for
/// `Job.workerId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobTarget {
    Worker(WorkerProfileId),
    Workflow(RunId),
}

impl fmt::Display for JobTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobTarget::Worker(id) => write!(f, "{id}"),
            JobTarget::Workflow(id) => write!(f, "workflow:{id}"),
        }
    }
}

impl Serialize for JobTarget {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for JobTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.strip_prefix("workflow:") {
            Some(rest) => JobTarget::Workflow(RunId::from_string(rest)),
            None => JobTarget::Worker(WorkerProfileId::from_string(&s)),
        })
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
