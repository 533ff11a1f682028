// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn stream_chunk_request_camel_case_shape() {
    let req = StreamChunkRequest {
        worker_id: WorkerProfileId::from_string("wkp-coder"),
        job_id: None,
        chunk: "hi".into(),
        r#final: false,
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["workerId"], "wkp-coder");
    assert_eq!(json["chunk"], "hi");
    assert!(json.get("jobId").is_none());
}

#[test]
fn stream_chunk_request_deserializes_minimal_body() {
    let json = serde_json::json!({"workerId": "wkp-coder", "chunk": "hi"});
    let req: StreamChunkRequest = serde_json::from_value(json).unwrap();
    assert!(!req.r#final);
    assert!(req.job_id.is_none());
}

#[test]
fn error_response_shape() {
    let resp = ErrorResponse::new("unauthorized");
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["error"], "unauthorized");
}
