// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Backend error taxonomy (spec §4.D, §7).

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("model resolution failed: {0}")]
    Resolution(#[from] orc_resolver::ResolverError),

    #[error("failed to spawn worker process: {0}")]
    SpawnFailed(String),

    #[error("worker process did not become ready within {elapsed_ms}ms: {tail}")]
    SpawnTimeout { elapsed_ms: u64, tail: String },

    #[error("worker process exited before becoming ready: {status}")]
    ProcessExited { status: String },

    #[error("required tool {tool:?} not found on worker")]
    ToolMissing { tool: String },

    #[error("worker is not ready (status={status})")]
    NotReady { status: String },

    #[error("rpc call to worker failed: {0}")]
    Rpc(String),

    #[error("timed out waiting for worker response after {0:?}")]
    ResponseTimeout(std::time::Duration),

    #[error("no response text could be extracted from worker message")]
    NoResponseText,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
