// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;
use warden_core::{DecisionCategory, DecisionId};

#[test]
fn recorded_decisions_read_back_in_append_order() {
    let dir = tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    let first = ArchitecturalDecision {
        id: DecisionId::new(),
        originating_task: Some("task-001".to_string()),
        session_id: "session-001".to_string(),
        category: DecisionCategory::Naming,
        decision: "use snake_case for field names".to_string(),
        rationale: "matches existing schema".to_string(),
        timestamp_ms: 100,
    };
    let second = ArchitecturalDecision { timestamp_ms: 200, ..first.clone() };
    record_decision(&paths, &first).expect("record first");
    record_decision(&paths, &second).expect("record second");

    let all = list_decisions(&paths).expect("list");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].timestamp_ms, 100);
    assert_eq!(all[1].timestamp_ms, 200);
}

#[test]
fn list_decisions_before_any_record_is_empty() {
    let dir = tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    assert!(list_decisions(&paths).expect("list").is_empty());
}
