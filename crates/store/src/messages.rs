// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-session message logs under `messages/<session>.jsonl`.

use warden_core::Message;

use crate::atomic::{append_jsonl_locked, read_jsonl};
use crate::error::StoreError;
use crate::layout::ProjectPaths;

pub fn post_message(
    paths: &ProjectPaths,
    session_id: &str,
    message: &Message,
) -> Result<(), StoreError> {
    append_jsonl_locked(&paths.message_log_file(session_id), message)
}

pub fn read_messages(paths: &ProjectPaths, session_id: &str) -> Result<Vec<Message>, StoreError> {
    read_jsonl(&paths.message_log_file(session_id))
}

/// Read every message posted after `since_ms`, addressed to `recipient`
/// (or broadcast), across all session logs.
pub fn read_updates_for(
    paths: &ProjectPaths,
    recipient: &str,
    since_ms: u64,
) -> Result<Vec<Message>, StoreError> {
    let dir = paths.messages_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut updates = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
        let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        let messages: Vec<Message> = read_jsonl(&path)?;
        updates.extend(
            messages
                .into_iter()
                .filter(|m| m.timestamp_ms >= since_ms && m.addressed_to(recipient)),
        );
    }
    updates.sort_by_key(|m| m.timestamp_ms);
    Ok(updates)
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
