// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn save_then_get_round_trips() {
    let dir = tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    let status = SessionStatus::new(SessionId::sequential(1), 100);
    save_session_status(&paths, &status).expect("save");
    let loaded = get_session_status(&paths, &status.session_id).expect("get");
    assert_eq!(loaded.session_id, status.session_id);
}

#[test]
fn try_get_missing_session_returns_none() {
    let dir = tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    let loaded = try_get_session_status(&paths, &SessionId::sequential(1)).expect("try get");
    assert!(loaded.is_none());
}

#[test]
fn list_session_statuses_sorts_by_id() {
    let dir = tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    save_session_status(&paths, &SessionStatus::new(SessionId::sequential(2), 100)).expect("save 2");
    save_session_status(&paths, &SessionStatus::new(SessionId::sequential(1), 100)).expect("save 1");
    let listed = list_session_statuses(&paths).expect("list");
    assert_eq!(listed[0].session_id, SessionId::sequential(1));
    assert_eq!(listed[1].session_id, SessionId::sequential(2));
}
