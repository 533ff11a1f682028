// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::Body;
use axum::http::Request;
use orc_core::FakeClock;
use tower::ServiceExt as _;

fn test_router() -> (Router, String) {
    let token = "test-token".to_string();
    let state = BridgeState::new(Arc::new(EventBus::new(Arc::new(Metrics::new()))), Arc::new(Metrics::new()), token.clone(), FakeClock::new());
    (router(state), token)
}

// Spec §8 scenario S6: no Authorization header -> 401 {"error":"unauthorized"}.
#[tokio::test]
async fn stream_chunk_without_bearer_is_unauthorized() {
    let (app, _token) = test_router();
    let request = Request::post("/v1/stream/chunk")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"workerId":"wkp-1","chunk":"hi"}"#))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let parsed: ErrorResponse = serde_json::from_slice(&body).expect("json");
    assert_eq!(parsed.error, "unauthorized");
}

// Spec §8 scenario S6: correct bearer + body -> {"ok":true,"timestamp":<n>}.
#[tokio::test]
async fn stream_chunk_with_correct_bearer_acks() {
    let (app, token) = test_router();
    let request = Request::post("/v1/stream/chunk")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(r#"{"workerId":"wkp-coder","chunk":"hi"}"#))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let parsed: StreamChunkResponse = serde_json::from_slice(&body).expect("json");
    assert!(parsed.ok);
}

#[tokio::test]
async fn malformed_json_body_is_bad_request() {
    let (app, token) = test_router();
    let request = Request::post("/v1/stream/chunk")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from("not json"))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (app, _token) = test_router();
    let request = Request::get("/v1/nope").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_on_a_known_path_is_method_not_allowed() {
    let (app, _token) = test_router();
    let request = Request::delete("/v1/events").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn events_post_without_bearer_is_unauthorized() {
    let (app, _token) = test_router();
    let request = Request::post("/v1/events")
        .body(Body::from(r#"{"type":"orchestra.worker.status","data":{}}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// Spec §8 scenario S6 end to end: a client POSTing a chunk shows up on
// the GET /v1/stream SSE feed, filtered by workerId.
#[tokio::test]
async fn stream_chunk_is_observable_on_the_sse_feed() {
    let token = "sse-token".to_string();
    let state = BridgeState::new(Arc::new(EventBus::new(Arc::new(Metrics::new()))), Arc::new(Metrics::new()), token.clone(), FakeClock::new());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let client = reqwest::Client::new();
    let sse_response = client
        .get(format!("http://{addr}/v1/stream?workerId=wkp-coder"))
        .send()
        .await
        .expect("sse connect");
    assert_eq!(sse_response.status(), reqwest::StatusCode::OK);
    let mut body_stream = sse_response.bytes_stream();

    client
        .post(format!("http://{addr}/v1/stream/chunk"))
        .header("authorization", format!("Bearer {token}"))
        .json(&serde_json::json!({ "workerId": "wkp-coder", "chunk": "hi" }))
        .send()
        .await
        .expect("post chunk")
        .error_for_status()
        .expect("2xx");

    use futures::StreamExt as _;
    let chunk = tokio::time::timeout(std::time::Duration::from_secs(2), body_stream.next())
        .await
        .expect("sse data within timeout")
        .expect("stream item")
        .expect("bytes");
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("\"workerId\":\"wkp-coder\""));
    assert!(text.contains("\"chunk\":\"hi\""));
}
