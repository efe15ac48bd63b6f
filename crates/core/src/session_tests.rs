// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_session_starts_in_starting_state() {
    let status = SessionStatus::new(SessionId::sequential(1), 42);
    assert_eq!(status.state, SessionState::Starting);
    assert_eq!(status.updated_at_ms, 42);
    assert!(status.completed_tasks.is_empty());
}

#[test]
fn done_and_failed_are_not_active() {
    assert!(!SessionState::Done.is_active());
    assert!(!SessionState::Failed.is_active());
    assert!(SessionState::Working.is_active());
    assert!(SessionState::Idle.is_active());
}

#[test]
fn session_id_formats_with_prefix_and_padding() {
    assert_eq!(SessionId::sequential(3).as_str(), "session-003");
}
