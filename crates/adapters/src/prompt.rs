// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt composition and response extraction (spec §4.D.3 steps 3 and
//! 5). No teacher analog — the coop adapter just forwards raw text
//! (`nudge`/`input`); this module is grounded directly on the spec's
//! own marker format and extraction order.

use crate::client::{AssistantMessage, MessagePart, OcServerClient};
use crate::error::BackendError;
use std::time::Duration;

/// Who originated a prompt, and under what correlation id, embedded as
/// a `<message-source>` marker (spec §4.D.3 step 3).
pub struct PromptSource<'a> {
    pub from: &'a str,
    pub job_id: Option<&'a str>,
}

/// Compose the final prompt body sent to `session.prompt(...)`.
/// `job_id` present ⇒ wrapped in `<orchestrator-job id=...>` (the
/// caller awaits asynchronously); absent ⇒ `<orchestrator-sync>` (the
/// caller is fire-and-await).
pub fn compose(message: &str, source: &PromptSource<'_>) -> String {
    let source_tag = match source.job_id {
        Some(job_id) => format!(r#"<message-source from="{}" jobId="{}">"#, source.from, job_id),
        None => format!(r#"<message-source from="{}">"#, source.from),
    };
    let (open, close) = match source.job_id {
        Some(job_id) => (format!(r#"<orchestrator-job id="{job_id}">"#), "</orchestrator-job>".to_string()),
        None => ("<orchestrator-sync>".to_string(), "</orchestrator-sync>".to_string()),
    };
    format!("{open}\n{source_tag}\n{message}\n</message-source>\n{close}")
}

/// Extraction order from spec §4.D.3 step 5: `text`/`reasoning` parts
/// first, else concatenated `stream_chunk` tool-call content.
pub fn extract_text(message: &AssistantMessage) -> Option<String> {
    let direct: String = message
        .parts
        .iter()
        .filter_map(|p| match p {
            MessagePart::Text { text } | MessagePart::Reasoning { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");
    if !direct.is_empty() {
        return Some(direct);
    }

    let chunks: String = message
        .parts
        .iter()
        .filter_map(|p| match p {
            MessagePart::ToolCall { tool, content } if tool == "stream_chunk" => content.as_deref(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");
    if !chunks.is_empty() {
        return Some(chunks);
    }
    None
}

const RETRY_BACKOFFS_MS: [u64; 3] = [200, 400, 600];
const POLL_INTERVAL_MS: u64 = 500;

/// Response text plus a note on how it was obtained. `warning` is set
/// when the direct parts/`stream_chunk` read (spec §4.D.3 step 5 first
/// two bullets) came back empty and the text only surfaced via the
/// retry or poll fallback — that's worth a caller-visible warning even
/// though the call ultimately succeeded.
pub struct ExtractedResponse {
    pub text: String,
    pub warning: Option<String>,
}

/// If [`extract_text`] finds nothing directly in `message`, retry
/// fetching it by id a few times, then fall back to polling recent
/// messages until `deadline` (spec §4.D.3 step 5 "Retry" / "Poll").
pub async fn extract_with_fallback(
    client: &dyn OcServerClient,
    session_id: &str,
    message: AssistantMessage,
    deadline: Duration,
) -> Result<ExtractedResponse, BackendError> {
    if let Some(text) = extract_text(&message) {
        return Ok(ExtractedResponse { text, warning: None });
    }

    for backoff_ms in RETRY_BACKOFFS_MS {
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        if let Ok(refetched) = client.message_get(session_id, &message.id).await {
            if let Some(text) = extract_text(&refetched) {
                return Ok(ExtractedResponse {
                    text,
                    warning: Some("response text was empty on the first read and only appeared after a retry fetch".to_string()),
                });
            }
        }
    }

    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        if let Ok(messages) = client.recent_messages(session_id, 10).await {
            if let Some(latest) = messages.last() {
                if let Some(text) = extract_text(latest) {
                    return Ok(ExtractedResponse {
                        text,
                        warning: Some("response text required polling recent messages before it was available".to_string()),
                    });
                }
            }
        }
    }

    Err(BackendError::NoResponseText)
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
