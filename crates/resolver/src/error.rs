// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolver error taxonomy (spec §7: config errors vs. resolution
//! errors). Grounded on `orc-core`'s thiserror idiom (named variants
//! carrying just enough context for a caller-facing message, never a
//! formatted prose blob).

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// OCServer config is missing data the algorithm needs (e.g. no
    /// usable providers at all).
    #[error("model resolver config error: {0}")]
    Config(String),

    /// The algorithm ran but could not produce a resolution: no
    /// provider/model satisfied the profile's requirements.
    #[error("could not resolve a model for tag {tag:?}: {reason}")]
    Resolution { tag: String, reason: String },

    /// Spec §8 invariant 4: a vision-tagged or `supportsVision` profile
    /// can never be resolved to a model lacking image input capability.
    /// This is always a hard failure, never a silent downgrade.
    #[error("no vision-capable model available for profile {profile_id}")]
    NoVisionCapableModel { profile_id: String },

    /// An explicit `provider/model` reference did not match any known
    /// provider or model in the full provider set.
    #[error("unknown model reference {provider}/{model}")]
    UnknownModelReference { provider: String, model: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
