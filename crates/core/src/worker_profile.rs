// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable worker profile templates (spec §3 `WorkerProfile`).

use crate::ids::WorkerProfileId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What kind of backend a profile spawns (spec §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    /// Spawns a dedicated `ocserve` subprocess.
    Server,
    /// Forks/creates a session on an existing OCServer via RPC only.
    Agent,
    /// Like `Agent`, but forked from a parent session.
    Subagent,
}

crate::simple_display! {
    WorkerKind {
        Server => "server",
        Agent => "agent",
        Subagent => "subagent",
    }
}

/// How a spawned worker should run relative to the host UI (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Foreground,
    Background,
}

crate::simple_display! {
    ExecutionMode {
        Foreground => "foreground",
        Background => "background",
    }
}

/// An abstract model tag (spec §4.C) that the Model Resolver turns into a
/// concrete `provider/model` id, or an already-qualified reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelSpec {
    /// `node:fast`, `node:vision`, `node:docs`.
    Tag(ModelTag),
    /// Bare `auto`, resolved like `node:fast` with no specific leaning.
    Auto,
    /// An explicit `provider/model` reference, trusted as-is.
    Explicit { provider: String, model: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTag {
    Fast,
    Vision,
    Docs,
}

impl ModelSpec {
    pub fn parse(s: &str) -> Self {
        match s {
            "node:fast" => ModelSpec::Tag(ModelTag::Fast),
            "node:vision" => ModelSpec::Tag(ModelTag::Vision),
            "node:docs" => ModelSpec::Tag(ModelTag::Docs),
            "auto" => ModelSpec::Auto,
            other => match other.split_once('/') {
                Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
                    ModelSpec::Explicit {
                        provider: provider.to_string(),
                        model: model.to_string(),
                    }
                }
                _ => ModelSpec::Explicit {
                    provider: String::new(),
                    model: other.to_string(),
                },
            },
        }
    }

    pub fn is_vision_tag(&self) -> bool {
        matches!(self, ModelSpec::Tag(ModelTag::Vision))
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::Tag(ModelTag::Fast) => write!(f, "node:fast"),
            ModelSpec::Tag(ModelTag::Vision) => write!(f, "node:vision"),
            ModelSpec::Tag(ModelTag::Docs) => write!(f, "node:docs"),
            ModelSpec::Auto => write!(f, "auto"),
            ModelSpec::Explicit { provider, model } => write!(f, "{provider}/{model}"),
        }
    }
}

impl Serialize for ModelSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ModelSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ModelSpec::parse(&s))
    }
}

/// Immutable template a [`crate::WorkerInstance`] is spawned from.
#[serde(rename_all = "camelCase")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub id: WorkerProfileId,
    pub name: String,
    pub purpose: String,
    pub when_to_use: String,
    pub model: ModelSpec,
    pub kind: WorkerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionMode>,
    #[serde(default)]
    pub supports_vision: bool,
    #[serde(default)]
    pub supports_web: bool,
    #[serde(default)]
    pub tools: BTreeMap<String, bool>,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub tags: IndexSet<String>,
    pub system_prompt: String,
    #[serde(default)]
    pub inject_repo_context: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_port: Option<u16>,
}

impl WorkerProfile {
    /// `true` if this profile must never be resolved to a model lacking
    /// image input capability (spec §4.C, invariant 4 in §8).
    pub fn requires_vision(&self) -> bool {
        self.supports_vision || self.model.is_vision_tag()
    }
}

#[cfg(test)]
#[path = "worker_profile_tests.rs"]
mod tests;
