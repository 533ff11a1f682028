// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_config_has_no_configured_models() {
    let cfg = ResolverConfig::default();
    assert!(cfg.model.is_none());
    assert!(cfg.small_model.is_none());
    assert!(cfg.default_opencode_model.is_none());
}

#[test]
fn hard_fallback_is_opencode_gpt_5_nano() {
    assert_eq!(HARD_FALLBACK_MODEL, "opencode/gpt-5-nano");
}
