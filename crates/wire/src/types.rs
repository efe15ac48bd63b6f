// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supporting payload types carried inside `Response` variants.

use serde::{Deserialize, Serialize};
use warden_core::TaskId;

/// The completed-dependency context handed back on a successful claim, so
/// the worker doesn't need a second round trip to read each prerequisite's
/// result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencySummary {
    pub task_id: TaskId,
    pub summary: Option<String>,
    pub files_changed: Vec<String>,
}

/// Structured failure reasons for coordination verbs, kept distinct from a
/// bare string so the CLI and worker adapters can match on cause rather
/// than parsing `message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum RequestErrorKind {
    TaskNotFound { task_id: TaskId },
    TaskNotPending { task_id: TaskId, current: String },
    DependencyNotCompleted { task_id: TaskId, dependency: TaskId },
    NotOwner { task_id: TaskId, caller: String },
    SessionNotFound { session_id: String },
    TestRunFailed { reason: String },
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
