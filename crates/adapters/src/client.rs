// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RPC surface a Worker Backend needs from a running OCServer
//! instance (spec §4.D). Grounded on `crates/adapters/src/agent/coop/
//! adapter.rs`'s `AgentAdapter` trait (object-safe, `async_trait`,
//! one method per remote call), but speaking to a different remote —
//! an `opencode` server process rather than a coop sidecar — so the
//! concrete transport here is a small `reqwest`-based HTTP client
//! rather than the teacher's hand-rolled socket framing (the teacher
//! never links an HTTP client crate; `reqwest` is pulled in from the
//! wider example pack for this one external integration point).

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One part of an assistant message (spec §4.D.3 step 5 extraction
/// order: `text`, `reasoning`, then `stream_chunk` tool invocations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    Reasoning { text: String },
    ToolCall { tool: String, #[serde(default)] content: Option<String> },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub id: String,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// One entry of `session.list` (spec §6.2), used by the Worker Pool's
/// reuse-from-registry probe (spec §4.B step 3-4) to find a still-live
/// session to attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Abstract RPC surface to a live OCServer process (spec §4.D). Kept
/// object-safe (no `Clone` supertrait, unlike [`orc_core::Clock`]) so
/// callers can hold `Arc<dyn OcServerClient>`.
#[async_trait]
pub trait OcServerClient: Send + Sync {
    async fn tool_ids(&self, directory: &str) -> Result<Vec<String>, BackendError>;
    async fn session_create(&self, title: &str) -> Result<String, BackendError>;
    async fn session_fork(&self, parent_session_id: &str) -> Result<String, BackendError>;
    /// Spec §4.B reuse step 3: probe a candidate worker's OCServer for
    /// its live sessions. Callers bound this with their own timeout
    /// (spec mandates 3s for the reuse probe specifically).
    async fn session_list(&self, directory: &str) -> Result<Vec<SessionSummary>, BackendError>;
    async fn prompt(&self, session_id: &str, body: &str, timeout: Duration) -> Result<AssistantMessage, BackendError>;
    async fn message_get(&self, session_id: &str, message_id: &str) -> Result<AssistantMessage, BackendError>;
    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<AssistantMessage>, BackendError>;
}

/// Real client speaking JSON-over-HTTP to a spawned `ocserve` process.
pub struct HttpOcServerClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpOcServerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: reqwest::Client::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl OcServerClient for HttpOcServerClient {
    async fn tool_ids(&self, directory: &str) -> Result<Vec<String>, BackendError> {
        #[derive(Deserialize)]
        struct Resp {
            ids: Vec<String>,
        }
        let resp: Resp = self
            .http
            .get(self.url("/tool/ids"))
            .query(&[("directory", directory)])
            .send()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?;
        Ok(resp.ids)
    }

    async fn session_create(&self, title: &str) -> Result<String, BackendError> {
        #[derive(Deserialize)]
        struct Resp {
            id: String,
        }
        let resp: Resp = self
            .http
            .post(self.url("/session"))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?;
        Ok(resp.id)
    }

    async fn session_fork(&self, parent_session_id: &str) -> Result<String, BackendError> {
        #[derive(Deserialize)]
        struct Resp {
            id: String,
        }
        let resp: Resp = self
            .http
            .post(self.url(&format!("/session/{parent_session_id}/fork")))
            .send()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?;
        Ok(resp.id)
    }

    async fn session_list(&self, directory: &str) -> Result<Vec<SessionSummary>, BackendError> {
        self.http
            .get(self.url("/session"))
            .query(&[("directory", directory)])
            .send()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))
    }

    async fn prompt(&self, session_id: &str, body: &str, timeout: Duration) -> Result<AssistantMessage, BackendError> {
        self.http
            .post(self.url(&format!("/session/{session_id}/prompt")))
            .timeout(timeout)
            .json(&serde_json::json!({ "message": body }))
            .send()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))
    }

    async fn message_get(&self, session_id: &str, message_id: &str) -> Result<AssistantMessage, BackendError> {
        self.http
            .get(self.url(&format!("/session/{session_id}/message/{message_id}")))
            .send()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))
    }

    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<AssistantMessage>, BackendError> {
        self.http
            .get(self.url(&format!("/session/{session_id}/messages")))
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    /// In-memory stand-in for a live OCServer, used by backend/workflow
    /// tests (spec work doesn't need a real subprocess to exercise the
    /// prompt/extract contract).
    #[derive(Default)]
    pub struct FakeOcServerClient {
        pub tools: Mutex<Vec<String>>,
        pub next_message: Mutex<Option<AssistantMessage>>,
        pub sessions_created: Mutex<Vec<String>>,
        pub prompts_sent: Mutex<Vec<String>>,
        pub sessions: Mutex<Vec<SessionSummary>>,
    }

    impl FakeOcServerClient {
        pub fn with_tools(tools: Vec<&str>) -> Self {
            Self { tools: Mutex::new(tools.into_iter().map(String::from).collect()), ..Default::default() }
        }

        pub fn set_next_message(&self, msg: AssistantMessage) {
            *self.next_message.lock() = Some(msg);
        }

        pub fn with_sessions(sessions: Vec<SessionSummary>) -> Self {
            Self { sessions: Mutex::new(sessions), ..Default::default() }
        }
    }

    #[async_trait]
    impl OcServerClient for FakeOcServerClient {
        async fn tool_ids(&self, _directory: &str) -> Result<Vec<String>, BackendError> {
            Ok(self.tools.lock().clone())
        }

        async fn session_create(&self, title: &str) -> Result<String, BackendError> {
            let id = format!("ses-{}", self.sessions_created.lock().len());
            self.sessions_created.lock().push(title.to_string());
            Ok(id)
        }

        async fn session_fork(&self, parent_session_id: &str) -> Result<String, BackendError> {
            Ok(format!("{parent_session_id}-fork"))
        }

        async fn session_list(&self, _directory: &str) -> Result<Vec<SessionSummary>, BackendError> {
            Ok(self.sessions.lock().clone())
        }

        async fn prompt(&self, _session_id: &str, body: &str, _timeout: Duration) -> Result<AssistantMessage, BackendError> {
            self.prompts_sent.lock().push(body.to_string());
            self.next_message
                .lock()
                .clone()
                .ok_or_else(|| BackendError::Rpc("FakeOcServerClient: no next_message configured".into()))
        }

        async fn message_get(&self, _session_id: &str, message_id: &str) -> Result<AssistantMessage, BackendError> {
            self.next_message
                .lock()
                .clone()
                .filter(|m| m.id == message_id)
                .ok_or_else(|| BackendError::Rpc(format!("no such message {message_id}")))
        }

        async fn recent_messages(&self, _session_id: &str, _limit: usize) -> Result<Vec<AssistantMessage>, BackendError> {
            Ok(self.next_message.lock().clone().into_iter().collect())
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
