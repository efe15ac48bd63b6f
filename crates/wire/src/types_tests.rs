// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn dependency_summary_round_trips() {
    let dep = DependencySummary {
        task_id: TaskId::sequential(1),
        summary: Some("added the users table".to_string()),
        files_changed: vec!["migrations/001_users.sql".to_string()],
    };
    let json = serde_json::to_string(&dep).expect("serialize");
    let back: DependencySummary = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(dep, back);
}

#[test]
fn request_error_kind_tags_by_variant() {
    let err = RequestErrorKind::TaskNotPending {
        task_id: TaskId::sequential(2),
        current: "completed".to_string(),
    };
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"kind\":\"TaskNotPending\""));
}
