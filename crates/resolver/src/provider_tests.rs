// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn provider(source: ProviderSource, key: Option<&str>) -> Provider {
    Provider { id: "anthropic".into(), source, key: key.map(String::from), models: Vec::new() }
}

#[test]
fn opencode_id_is_always_usable_regardless_of_source() {
    let p = Provider { id: "opencode".into(), source: ProviderSource::Api, key: None, models: Vec::new() };
    assert!(p.is_usable());
}

#[test]
fn config_custom_env_sources_are_usable_without_a_key() {
    assert!(provider(ProviderSource::Config, None).is_usable());
    assert!(provider(ProviderSource::Custom, None).is_usable());
    assert!(provider(ProviderSource::Env, None).is_usable());
}

#[test]
fn api_source_requires_non_empty_key() {
    assert!(!provider(ProviderSource::Api, None).is_usable());
    assert!(!provider(ProviderSource::Api, Some("")).is_usable());
    assert!(provider(ProviderSource::Api, Some("sk-live")).is_usable());
}

#[test]
fn vision_capable_requires_image_or_attachment() {
    let none = ModelCapabilities::default();
    assert!(!none.is_vision_capable());
    assert!(ModelCapabilities { input_image: true, ..Default::default() }.is_vision_capable());
    assert!(ModelCapabilities { attachment: true, ..Default::default() }.is_vision_capable());
}
