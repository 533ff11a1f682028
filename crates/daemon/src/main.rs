// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin development harness (SPEC_FULL §10.1): binds the loopback
//! Bridge and runs it standalone so the rest of the system can be
//! exercised locally. The embedding host normally links `orc-daemon`
//! as a library and drives the public API in-process; this binary
//! exists only to exchange worker stream/event traffic over HTTP
//! without a host process.

use orc_core::SystemClock;
use orc_daemon::context::{InMemoryWorkflowCatalog, OrchestratorConfig, WorkerProfileCatalog};
use orc_daemon::OrchestratorContext;
use orc_resolver::ResolverConfig;
use orc_workflow::SkillPermissionMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let state_dir = std::env::var("ORC_STATE_DIR").map(PathBuf::from).unwrap_or_else(|_| std::env::temp_dir().join("orc-daemon"));
    std::fs::create_dir_all(&state_dir)?;

    let bind_addr: SocketAddr = std::env::var("ORC_BRIDGE_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:0".to_string()).parse()?;

    let config = OrchestratorConfig {
        state_dir,
        bridge_bind_addr: bind_addr,
        spawn_ready_timeout_ms: 30_000,
        prompt_timeout_ms: 600_000,
        workflow_limits: Default::default(),
        ocserve_command: std::env::var("ORC_OCSERVE_COMMAND").unwrap_or_else(|_| "opencode".to_string()),
        orchestrator_instance_id: std::env::var("ORC_INSTANCE_ID").unwrap_or_else(|_| nanoid::nanoid!(10)),
    };

    let context = OrchestratorContext::new(
        config,
        SystemClock,
        WorkerProfileCatalog::default(),
        InMemoryWorkflowCatalog::default(),
        SkillPermissionMap::new(std::iter::empty()),
        ResolverConfig::default(),
        Vec::new(),
        None,
    );

    let listener = tokio::net::TcpListener::bind(context.config.bridge_bind_addr).await?;
    let actual_addr = listener.local_addr()?;
    context.set_bridge_addr(actual_addr);
    tracing::info!(%actual_addr, bridge_token = %context.bridge_token, "bridge listening");

    let router = context.bridge_router();
    let serve = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal());
    serve.await?;

    context.shutdown(Duration::from_secs(10)).await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
