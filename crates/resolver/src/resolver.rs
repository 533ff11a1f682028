// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Model Resolver (spec §4.C): maps a profile's tag or explicit
//! model reference to a concrete, capability-checked `provider/model`.
//!
//! No teacher analog exists for multi-provider model selection; this
//! module is grounded directly on the spec's five-step algorithm, reusing
//! `orc_core::worker_profile::ModelSpec` for tag classification (already
//! built alongside `WorkerProfile`) and `orc-core`'s `thiserror` idiom
//! for [`ResolverError`].

use crate::config::{ResolverConfig, HARD_FALLBACK_MODEL};
use crate::error::ResolverError;
use crate::provider::{Provider, ProviderModel};
use orc_core::{ModelSpec, ModelTag, WorkerProfile};
use serde::{Deserialize, Serialize};

/// Outcome of [`resolve`]: the chosen `provider/model` id plus a
/// human-readable origin (spec §4.C return shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub resolved_model: String,
    pub reason: String,
}

fn split_provider_model(s: &str) -> Option<(&str, &str)> {
    s.split_once('/').filter(|(p, m)| !p.is_empty() && !m.is_empty())
}

fn find_model<'a>(providers: &'a [Provider], provider_id: &str, model_id: &str) -> Option<(&'a Provider, &'a ProviderModel)> {
    providers.iter().find(|p| p.id == provider_id).and_then(|p| p.models.iter().find(|m| m.id == model_id).map(|m| (p, m)))
}

fn find_model_among<'a>(providers: &[&'a Provider], provider_id: &str, model_id: &str) -> Option<(&'a Provider, &'a ProviderModel)> {
    providers
        .iter()
        .find(|p| p.id == provider_id)
        .and_then(|p| p.models.iter().find(|m| m.id == model_id).map(|m| (*p, m)))
}

/// Spec §4.C step 2: usable provider set.
fn usable_providers(providers: &[Provider]) -> Vec<&Provider> {
    providers.iter().filter(|p| p.is_usable()).collect()
}

fn catalog<'a>(providers: &'a [&'a Provider]) -> Vec<(&'a Provider, &'a ProviderModel)> {
    providers.iter().flat_map(|p| p.models.iter().map(move |m| (*p, m))).collect()
}

fn keyword_score(model_id: &str) -> i32 {
    let lower = model_id.to_lowercase();
    ["mini", "small", "flash", "fast", "haiku"].iter().filter(|k| lower.contains(**k)).count() as i32
}

/// Spec §4.C step 3, `fast`: prefer low-cost, clearly-named small models.
fn pick_fast<'a>(catalog: &[(&'a Provider, &'a ProviderModel)]) -> Option<(&'a Provider, &'a ProviderModel)> {
    catalog.iter().copied().max_by_key(|(_, m)| {
        (keyword_score(&m.id), std::cmp::Reverse(ordered_float(m.cost_per_million_tokens.unwrap_or(f64::MAX))))
    })
}

/// Spec §4.C step 3, `docs`: prefer tool-call support, reasoning, and
/// larger context windows.
fn pick_docs<'a>(catalog: &[(&'a Provider, &'a ProviderModel)]) -> Option<(&'a Provider, &'a ProviderModel)> {
    catalog.iter().copied().max_by_key(|(_, m)| {
        (m.capabilities.tool_calls as i32, m.capabilities.reasoning as i32, m.context_length.unwrap_or(0))
    })
}

/// Spec §4.C step 3, `vision`: only vision-capable candidates, preferring
/// the largest context window. Returns `None` if nothing qualifies —
/// callers must treat that as a hard failure, never a downgrade.
fn pick_vision<'a>(catalog: &[(&'a Provider, &'a ProviderModel)]) -> Option<(&'a Provider, &'a ProviderModel)> {
    catalog
        .iter()
        .copied()
        .filter(|(_, m)| m.capabilities.is_vision_capable())
        .max_by_key(|(_, m)| m.context_length.unwrap_or(0))
}

/// Cost is an `Option<f64>`; ordering floats needs a total order. Costs
/// are always finite, non-negative dollar amounts in practice, so this
/// truncates to a stable integer-ish comparable without pulling in a
/// crate for `f64::total_cmp` callers might not have.
fn ordered_float(cost: f64) -> i64 {
    (cost * 1_000_000.0).round() as i64
}

fn qualified(provider: &Provider, model: &ProviderModel) -> String {
    format!("{}/{}", provider.id, model.id)
}

/// Spec §4.C step 4: `config.model` → `opencode/<defaults.opencode>` →
/// `"opencode/gpt-5-nano"`, validated against the full provider set.
fn fallback_chain(config: &ResolverConfig, providers: &[Provider]) -> Result<Resolution, ResolverError> {
    let candidates: Vec<String> = [
        config.model.clone(),
        config.default_opencode_model.as_ref().map(|m| format!("opencode/{m}")),
        Some(HARD_FALLBACK_MODEL.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    for candidate in candidates {
        if let Some((provider, model)) = split_provider_model(&candidate) {
            if find_model(providers, provider, model).is_some() || candidate == HARD_FALLBACK_MODEL {
                return Ok(Resolution { resolved_model: candidate, reason: "fallback to default model (auto)".into() });
            }
        }
    }
    Err(ResolverError::Config("no usable fallback model found in provider set".into()))
}

fn resolve_tag(tag: ModelTag, config: &ResolverConfig, providers: &[Provider]) -> Result<Resolution, ResolverError> {
    let usable = usable_providers(providers);
    let cat = catalog(&usable);

    match tag {
        ModelTag::Vision => pick_vision(&cat)
            .map(|(p, m)| Resolution { resolved_model: qualified(p, m), reason: "auto-selected from configured models (node:vision)".into() })
            .ok_or(ResolverError::NoVisionCapableModel { profile_id: String::new() }),
        ModelTag::Fast => {
            if let Some(small) = config.small_model.as_deref() {
                if let Some((provider, model)) = split_provider_model(small) {
                    if find_model_among(&usable, provider, model).is_some() {
                        return Ok(Resolution { resolved_model: small.to_string(), reason: "configured (small_model)".into() });
                    }
                }
            }
            pick_fast(&cat)
                .map(|(p, m)| Resolution { resolved_model: qualified(p, m), reason: "auto-selected from configured models (node:fast)".into() })
                .map_or_else(|| fallback_chain(config, providers), Ok)
        }
        ModelTag::Docs => pick_docs(&cat)
            .map(|(p, m)| Resolution { resolved_model: qualified(p, m), reason: "auto-selected from configured models (node:docs)".into() })
            .map_or_else(|| fallback_chain(config, providers), Ok),
    }
}

/// Spec §4.C step 5: a vision-requiring profile must resolve to a
/// vision-capable model, verified against the full (not just usable)
/// provider set. Unknown models cannot be disproven, so they pass
/// through unchanged (the SDK capability query the spec falls back to
/// has no analog here).
fn verify_vision(resolution: Resolution, profile: &WorkerProfile, providers: &[Provider]) -> Result<Resolution, ResolverError> {
    if !profile.requires_vision() {
        return Ok(resolution);
    }
    if let Some((provider, model)) = split_provider_model(&resolution.resolved_model) {
        if let Some((_, m)) = find_model(providers, provider, model) {
            if !m.capabilities.is_vision_capable() {
                return Err(ResolverError::NoVisionCapableModel { profile_id: profile.id.to_string() });
            }
        }
    }
    Ok(resolution)
}

/// Produce `{resolvedModel, reason}` for `profile` (spec §4.C).
pub fn resolve(profile: &WorkerProfile, config: &ResolverConfig, providers: &[Provider]) -> Result<Resolution, ResolverError> {
    let resolution = match &profile.model {
        ModelSpec::Tag(tag) => resolve_tag(*tag, config, providers).map_err(|e| match e {
            ResolverError::NoVisionCapableModel { .. } => {
                ResolverError::NoVisionCapableModel { profile_id: profile.id.to_string() }
            }
            other => other,
        })?,
        ModelSpec::Auto => fallback_chain(config, providers)?,
        ModelSpec::Explicit { provider, model } => {
            if provider.is_empty() {
                return Err(ResolverError::Config(format!("malformed model reference {model:?}")));
            }
            match find_model(providers, provider, model) {
                Some((p, m)) => Resolution { resolved_model: qualified(p, m), reason: "configured".into() },
                None => Resolution { resolved_model: format!("{provider}/{model}"), reason: "configured".into() },
            }
        }
    };

    verify_vision(resolution, profile, providers)
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
