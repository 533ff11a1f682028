// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider/model discovery shapes consumed by the resolver (spec §4.C
//! inputs). No teacher analog exists for a multi-provider model catalog;
//! shaped directly from spec text (`id`, `source`, optional `key`,
//! `models`).

use serde::{Deserialize, Serialize};

/// Where OCServer learned about a provider (spec §4.C step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSource {
    Config,
    Custom,
    Env,
    Api,
}

/// Capability flags used by vision/docs scoring (spec §4.C step 3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCapabilities {
    #[serde(default)]
    pub input_image: bool,
    #[serde(default)]
    pub attachment: bool,
    #[serde(default)]
    pub tool_calls: bool,
    #[serde(default)]
    pub reasoning: bool,
}

impl ModelCapabilities {
    pub fn is_vision_capable(&self) -> bool {
        self.input_image || self.attachment
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderModel {
    pub id: String,
    #[serde(default)]
    pub capabilities: ModelCapabilities,
    #[serde(default)]
    pub cost_per_million_tokens: Option<f64>,
    #[serde(default)]
    pub context_length: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    pub source: ProviderSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub models: Vec<ProviderModel>,
}

impl Provider {
    /// Spec §4.C step 2: `id = "opencode"` OR `source ∈ {config, custom,
    /// env}` OR (`source = api` AND `key` is non-empty).
    pub fn is_usable(&self) -> bool {
        self.id == "opencode"
            || matches!(self.source, ProviderSource::Config | ProviderSource::Custom | ProviderSource::Env)
            || (self.source == ProviderSource::Api && self.key.as_deref().is_some_and(|k| !k.is_empty()))
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
