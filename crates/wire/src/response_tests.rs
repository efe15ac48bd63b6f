// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn test_run_truncates_to_last_5000_chars() {
    let output = "x".repeat(6000);
    let response = Response::test_run(true, &output);
    match response {
        Response::TestRun { passed, output_tail } => {
            assert!(passed);
            assert_eq!(output_tail.len(), 5000);
        }
        other => panic!("expected TestRun, got {other:?}"),
    }
}

#[test]
fn test_run_keeps_short_output_whole() {
    let response = Response::test_run(false, "one failing assertion");
    match response {
        Response::TestRun { output_tail, .. } => assert_eq!(output_tail, "one failing assertion"),
        other => panic!("expected TestRun, got {other:?}"),
    }
}

#[test]
fn error_response_round_trips_through_json() {
    let response = Response::Error {
        error: RequestErrorKind::TaskNotFound { task_id: warden_core::TaskId::sequential(1) },
        message: "task-001 not found".to_string(),
    };
    let json = serde_json::to_string(&response).expect("serialize");
    let back: Response = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(response, back);
}
