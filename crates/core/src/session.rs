// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker session bookkeeping.

use serde::{Deserialize, Serialize};

crate::define_sequential_id! {
    /// Stable, monotone worker session identifier (`session-001`, ...).
    pub struct SessionId("session-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Starting,
    Working,
    Idle,
    Pausing,
    Paused,
    Done,
    Failed,
}

crate::simple_display! {
    SessionState {
        Starting => "starting",
        Working => "working",
        Idle => "idle",
        Pausing => "pausing",
        Paused => "paused",
        Done => "done",
        Failed => "failed",
    }
}

impl SessionState {
    /// Sessions in these states are not doing useful work and are safe
    /// candidates for the supervisor's respawn check.
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Done | SessionState::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub state: SessionState,
    pub current_task: Option<String>,
    pub completed_tasks: Vec<String>,
    pub progress_note: Option<String>,
    pub updated_at_ms: u64,
}

impl SessionStatus {
    pub fn new(session_id: SessionId, now_ms: u64) -> Self {
        Self {
            session_id,
            state: SessionState::Starting,
            current_task: None,
            completed_tasks: Vec::new(),
            progress_note: None,
            updated_at_ms: now_ms,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
