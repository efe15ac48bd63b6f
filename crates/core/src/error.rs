// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error vocabulary for the domain model.

/// Errors raised while constructing or mutating domain records.
///
/// Distinct from the store's I/O errors (see `warden-store`) and the
/// adapter errors of external tools (see `warden-adapters`); this is purely
/// about invariant violations on in-memory records.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unknown {field} value: {value:?}")]
    UnknownEnumValue { field: &'static str, value: String },

    #[error("task {task} is not pending (current status: {current})")]
    TaskNotPending { task: String, current: String },

    #[error("task {task} is not owned by {caller} (owner: {owner:?})")]
    TaskNotOwnedBy { task: String, caller: String, owner: Option<String> },

    #[error("task {task} depends on {dep}, which is not completed (status: {dep_status})")]
    DependencyNotCompleted { task: String, dep: String, dep_status: String },

    #[error("duplicate task subject: {0}")]
    DuplicateTaskSubject(String),

    #[error("dependency cycle detected involving task {0}")]
    DependencyCycle(String),
}
