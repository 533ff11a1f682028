// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn tool_missing_names_the_tool() {
    let err = BackendError::ToolMissing { tool: "stream_chunk".into() };
    assert!(err.to_string().contains("stream_chunk"));
}

#[test]
fn spawn_timeout_includes_elapsed_and_tail() {
    let err = BackendError::SpawnTimeout { elapsed_ms: 30_000, tail: "port in use".into() };
    let msg = err.to_string();
    assert!(msg.contains("30000"));
    assert!(msg.contains("port in use"));
}
