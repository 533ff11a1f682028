// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire DTOs shared across the workspace: the Device Registry file
//! schema, the Bridge's HTTP request/response bodies, and the public
//! in-process task API shapes.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bridge;
pub mod registry;
pub mod task_api;

pub use bridge::{
    AckResponse, ErrorResponse, RemoteEventRequest, StreamChunkEvent, StreamChunkRequest,
    StreamChunkResponse,
};
pub use registry::{DeviceRegistryEntry, DeviceRegistryFile, REGISTRY_SCHEMA_VERSION};
pub use task_api::{
    PeekResult, TaskCancelRequest, TaskIdSelector, TaskKind, TaskListFormat, TaskListRequest,
    TaskListView, TaskStartRequest, TaskStartResponse,
};
