// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill preflight (spec §4.F, GLOSSARY "Skill preflight": "every skill
//! named in a workflow or worker profile is discoverable and not
//! denied by the permission map"). No teacher analog — grounded
//! directly on `orc_core::WorkerProfile::tools`'s `BTreeMap<String,
//! bool>` shape, reused here for the permission map.

use crate::error::WorkflowError;
use std::collections::{BTreeMap, BTreeSet};

/// Whether a skill is known, and if so, permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillStatus {
    Allowed,
    Denied,
    Unknown,
}

/// Object-safe seam to whatever backs the permission map (spec leaves
/// its storage unspecified — kept abstract like `orc_registry::
/// Liveness` so a daemon-level config store can implement it).
pub trait SkillRegistry: Send + Sync {
    fn status(&self, skill: &str) -> SkillStatus;
}

/// In-memory permission map: known skills map to whether they're
/// granted; anything absent is [`SkillStatus::Unknown`].
#[derive(Debug, Clone, Default)]
pub struct SkillPermissionMap(BTreeMap<String, bool>);

impl SkillPermissionMap {
    pub fn new(entries: impl IntoIterator<Item = (String, bool)>) -> Self {
        Self(entries.into_iter().collect())
    }
}

impl SkillRegistry for SkillPermissionMap {
    fn status(&self, skill: &str) -> SkillStatus {
        match self.0.get(skill) {
            Some(true) => SkillStatus::Allowed,
            Some(false) => SkillStatus::Denied,
            None => SkillStatus::Unknown,
        }
    }
}

/// Abort with a structured error on the first missing/denied skill
/// (spec §4.F validation step).
pub fn validate_skills(required: &BTreeSet<String>, registry: &dyn SkillRegistry) -> Result<(), WorkflowError> {
    for skill in required {
        match registry.status(skill) {
            SkillStatus::Allowed => {}
            SkillStatus::Denied => return Err(WorkflowError::SkillDenied { skill: skill.clone() }),
            SkillStatus::Unknown => return Err(WorkflowError::SkillUnknown { skill: skill.clone() }),
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "skills_tests.rs"]
mod tests;
