// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn claim_task_round_trips_through_json() {
    let req = Request::ClaimTask { task_id: TaskId::sequential(1) };
    let json = serde_json::to_string(&req).expect("serialize");
    let back: Request = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(req, back);
}

#[test]
fn list_tasks_status_filter_is_optional() {
    let json = r#"{"verb":"ListTasks"}"#;
    let req: Request = serde_json::from_str(json).expect("deserialize");
    assert_eq!(req, Request::ListTasks { status: None });
}

#[test]
fn run_tests_defaults_to_empty_file_list() {
    let json = r#"{"verb":"RunTests"}"#;
    let req: Request = serde_json::from_str(json).expect("deserialize");
    assert_eq!(req, Request::RunTests { files: Vec::new(), timeout_secs: None });
}
