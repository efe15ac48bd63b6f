// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only architectural decision log at `decisions.jsonl`.

use warden_core::ArchitecturalDecision;

use crate::atomic::{append_jsonl_locked, read_jsonl};
use crate::error::StoreError;
use crate::layout::ProjectPaths;

pub fn record_decision(
    paths: &ProjectPaths,
    decision: &ArchitecturalDecision,
) -> Result<(), StoreError> {
    append_jsonl_locked(&paths.decisions_file(), decision)
}

pub fn list_decisions(paths: &ProjectPaths) -> Result<Vec<ArchitecturalDecision>, StoreError> {
    read_jsonl(&paths.decisions_file())
}

#[cfg(test)]
#[path = "decisions_tests.rs"]
mod tests;
