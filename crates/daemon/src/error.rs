// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level error taxonomy (spec §7 `BridgeError`, plus the Worker
//! Pool's own `SpawnError`/`ConfigError` surfaces not already owned by
//! `orc-backend`/`orc-resolver`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no worker profile registered with id {worker_id}")]
    UnknownProfile { worker_id: String },
    #[error("worker {worker_id} spawn failed: {source}")]
    SpawnFailed { worker_id: String, source: orc_backend::BackendError },
    #[error("worker {worker_id} is not registered")]
    UnknownWorker { worker_id: String },
}

/// Spec §7 `BridgeError`: malformed JSON or a bad bearer token. Always
/// surfaces as an HTTP 4xx, never a panic.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("malformed request body: {0}")]
    BadRequest(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] orc_registry::RegistryError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Workflow(#[from] orc_workflow::WorkflowError),
    /// `getOrSpawn` failed; the underlying `PoolError` is shared with
    /// every other waiter on the same in-flight spawn (`Arc<PoolError>`
    /// from `WorkerPool::get_or_spawn`), so it's flattened to a message
    /// here rather than threaded through as an owned value.
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("unknown task kind")]
    UnknownKind,
}

impl From<std::sync::Arc<PoolError>> for ApiError {
    fn from(err: std::sync::Arc<PoolError>) -> Self {
        ApiError::Spawn(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
