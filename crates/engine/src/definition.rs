// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static workflow definitions (spec §4.F: "A Workflow is an ordered
//! list of steps"). Not to be confused with `orc_core::WorkflowRunState`,
//! which is the live/persisted state of one run through a definition.

use orc_core::{WorkerProfileId, WorkflowId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One step in a [`WorkflowDefinition`] (spec §4.F step shape).
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStepDef {
    pub id: String,
    pub title: String,
    pub worker_id: WorkerProfileId,
    pub prompt: String,
    /// Feed this step's response as `{carry}` into the next step's prompt.
    #[serde(default)]
    pub carry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
}

/// An ordered, named sequence of steps (spec §4.F).
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    pub name: String,
    pub steps: Vec<WorkflowStepDef>,
}

impl WorkflowDefinition {
    /// Union of every step's own `requiredSkills`. This is only half
    /// of the spec §4.F skill preflight: the runner additionally unions
    /// in each step's worker profile's `requiredSkills` via
    /// `WorkflowHost::worker_required_skills`, since resolving a
    /// `workerId` to a profile requires the host.
    pub fn required_skills(&self) -> BTreeSet<String> {
        self.steps.iter().flat_map(|s| s.required_skills.iter().cloned()).collect()
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
