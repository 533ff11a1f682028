// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OCServer-side configuration consulted by the resolver (spec §4.C
//! inputs and fallback chain).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// `config.model`: top of the fallback chain.
    #[serde(default)]
    pub model: Option<String>,
    /// `config.small_model`: preferred for `node:fast` when it resolves.
    #[serde(default)]
    pub small_model: Option<String>,
    /// `defaults.opencode`: second link in the fallback chain, combined
    /// with the literal `opencode/` provider prefix.
    #[serde(default)]
    pub default_opencode_model: Option<String>,
}

/// Last-resort fallback (spec §4.C step 4), used when neither
/// `config.model` nor `defaults.opencode` is set.
pub const HARD_FALLBACK_MODEL: &str = "opencode/gpt-5-nano";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
