// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The loopback Bridge HTTP/SSE server (spec §4.G, §6.3): the side
//! channel spawned workers use to stream output back and to publish
//! their own events, plus the SSE feed external consumers attach to.
//! Grounded on the teacher's `daemon/src/listener/` module (an
//! in-process HTTP listener embedded in the daemon crate rather than
//! split out), rebuilt on `axum` per this workspace's ambient stack
//! (the teacher hand-rolls its listener's framing; the other example
//! repos in the pack reach for `axum` for exactly this shape of small
//! loopback control server).

use crate::bus::EventBus;
use crate::error::BridgeError;
use crate::metrics::Metrics;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use futures::StreamExt;
use orc_core::event::{EventPayload, OrchestratorEvent, WorkerStatusPayload, WorkerStreamPayload};
use orc_core::{Clock, JobId, WorkerProfileId};
use orc_wire::{AckResponse, ErrorResponse, RemoteEventRequest, StreamChunkEvent, StreamChunkRequest, StreamChunkResponse};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const KEEPALIVE: Duration = Duration::from_secs(30);

/// Everything the Bridge's handlers need, independent of the rest of
/// the Orchestrator Context.
pub struct BridgeState<C: Clock> {
    pub bus: Arc<EventBus>,
    pub metrics: Arc<Metrics>,
    pub token: String,
    pub clock: C,
    pub stream_tx: broadcast::Sender<StreamChunkEvent>,
}

impl<C: Clock> BridgeState<C> {
    pub fn new(bus: Arc<EventBus>, metrics: Arc<Metrics>, token: impl Into<String>, clock: C) -> Arc<Self> {
        let (stream_tx, _) = broadcast::channel(crate::bus::DEFAULT_CAPACITY);
        Arc::new(Self { bus, metrics, token: token.into(), clock, stream_tx })
    }
}

/// Base64url(18 random bytes), matching spec §4.G's bearer token shape.
pub fn generate_token() -> String {
    use base64::Engine;
    let mut bytes = [0u8; 18];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub fn router<C: Clock + 'static>(state: Arc<BridgeState<C>>) -> Router {
    Router::new()
        .route("/v1/stream/chunk", post(stream_chunk::<C>))
        .route("/v1/stream", get(stream_get::<C>))
        .route("/v1/events", post(events_post::<C>).get(events_get::<C>))
        .fallback(fallback)
        .with_state(state)
}

async fn fallback() -> Response {
    bridge_error_response(&BridgeError::NotFound)
}

fn bridge_error_response(err: &BridgeError) -> Response {
    let status = match err {
        BridgeError::Unauthorized => StatusCode::UNAUTHORIZED,
        BridgeError::NotFound => StatusCode::NOT_FOUND,
        BridgeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        BridgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

fn check_bearer<C: Clock>(state: &BridgeState<C>, headers: &HeaderMap) -> Result<(), BridgeError> {
    let header = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    match header {
        Some(value) if value == format!("Bearer {}", state.token) => Ok(()),
        _ => Err(BridgeError::Unauthorized),
    }
}

async fn stream_chunk<C: Clock>(
    State(state): State<Arc<BridgeState<C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(err) = check_bearer(&state, &headers) {
        return bridge_error_response(&err);
    }
    let request: StreamChunkRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return bridge_error_response(&BridgeError::BadRequest(e.to_string())),
    };

    let timestamp = state.clock.epoch_ms();
    let event = StreamChunkEvent {
        worker_id: request.worker_id,
        job_id: request.job_id,
        chunk: request.chunk.clone(),
        r#final: request.r#final,
        timestamp,
    };
    let _ = state.stream_tx.send(event);
    state.bus.publish(OrchestratorEvent::new(
        timestamp,
        EventPayload::WorkerStream(WorkerStreamPayload {
            worker_id: request.worker_id,
            job_id: request.job_id,
            chunk: request.chunk,
            r#final: request.r#final,
        }),
    ));

    Json(StreamChunkResponse { ok: true, timestamp }).into_response()
}

#[derive(serde::Deserialize)]
pub struct StreamFilter {
    #[serde(rename = "workerId")]
    pub worker_id: Option<WorkerProfileId>,
    #[serde(rename = "jobId")]
    pub job_id: Option<JobId>,
}

async fn stream_get<C: Clock + 'static>(
    State(state): State<Arc<BridgeState<C>>>,
    Query(filter): Query<StreamFilter>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.stream_tx.subscribe();
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(move |item| {
        let filter_worker = filter.worker_id;
        let filter_job = filter.job_id;
        async move {
            let event = item.ok()?;
            if filter_worker.is_some_and(|w| w != event.worker_id) {
                return None;
            }
            if filter_job.is_some() && filter_job != event.job_id {
                return None;
            }
            let data = serde_json::to_string(&event).ok()?;
            Some(Ok(SseEvent::default().data(data)))
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEPALIVE).text("ping"))
}

async fn events_post<C: Clock>(
    State(state): State<Arc<BridgeState<C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(err) = check_bearer(&state, &headers) {
        return bridge_error_response(&err);
    }
    let request: RemoteEventRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return bridge_error_response(&BridgeError::BadRequest(e.to_string())),
    };

    let timestamp = state.clock.epoch_ms();
    let payload = match request.r#type.as_str() {
        "orchestra.worker.status" => serde_json::from_value::<WorkerStatusPayload>(request.data)
            .map(EventPayload::WorkerStatus)
            .unwrap_or(EventPayload::Unknown { type_name: "orchestra.worker.status".into(), raw: serde_json::Value::Null }),
        other => EventPayload::Unknown { type_name: other.to_string(), raw: request.data },
    };
    state.bus.publish(OrchestratorEvent::new(timestamp, payload));

    Json(AckResponse { ok: true }).into_response()
}

async fn events_get<C: Clock + 'static>(
    State(state): State<Arc<BridgeState<C>>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = state.bus.subscribe_stream().map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(SseEvent::default().id(event.id.to_string()).event(event.payload.type_name()).data(data))
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEPALIVE).text("ping"))
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
