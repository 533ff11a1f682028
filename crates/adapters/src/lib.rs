// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-backend: the Worker Backend (spec §4.D). Spawns and talks to
//! the two worker variants (`server`: a dedicated `ocserve` subprocess;
//! `agent`/`subagent`: RPC-only sessions on an existing server) behind
//! a single [`client::OcServerClient`] surface.

pub mod attachment;
pub mod backend;
pub mod client;
pub mod error;
pub mod process;
pub mod prompt;

pub use attachment::AttachmentInput;
pub use backend::{send_to_worker, spawn_agent, spawn_server, SendRequest, SpawnServerRequest, SpawnedWorker, WorkerShutdown};
pub use client::{AssistantMessage, HttpOcServerClient, MessagePart, OcServerClient, SessionSummary};
pub use error::BackendError;

#[cfg(any(test, feature = "test-support"))]
pub use client::fake::FakeOcServerClient;
