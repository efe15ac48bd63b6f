// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The known-issue registry, a single locked record at `known-issues.json`.

use warden_core::{KnownIssue, KnownIssueId};

use crate::atomic::{read_json_opt, write_json_atomic, RecordLock};
use crate::error::StoreError;
use crate::layout::ProjectPaths;

pub fn load_known_issues(paths: &ProjectPaths) -> Result<Vec<KnownIssue>, StoreError> {
    Ok(read_json_opt(&paths.known_issues_file())?.unwrap_or_default())
}

/// Merge `incoming` into the registry under the registry's lock, skipping
/// any whose dedup key already exists.
pub fn add_known_issues(paths: &ProjectPaths, incoming: Vec<KnownIssue>) -> Result<(), StoreError> {
    let path = paths.known_issues_file();
    let _lock = RecordLock::acquire(&path)?;
    let mut registry: Vec<KnownIssue> = read_json_opt(&path)?.unwrap_or_default();
    warden_core::add_known_issues(&mut registry, incoming);
    write_json_atomic(&path, &registry)
}

pub fn mark_addressed(paths: &ProjectPaths, ids: &[KnownIssueId], cycle: u32) -> Result<(), StoreError> {
    let path = paths.known_issues_file();
    let _lock = RecordLock::acquire(&path)?;
    let mut registry: Vec<KnownIssue> = read_json_opt(&path)?.unwrap_or_default();
    warden_core::mark_addressed(&mut registry, ids, cycle);
    write_json_atomic(&path, &registry)
}

#[cfg(test)]
#[path = "known_issues_tests.rs"]
mod tests;
