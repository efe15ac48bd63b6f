// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session status records under `sessions/<id>/status.json`.

use warden_core::{SessionId, SessionStatus};

use crate::atomic::{read_json, read_json_opt, write_json_locked};
use crate::error::StoreError;
use crate::layout::ProjectPaths;

pub fn save_session_status(
    paths: &ProjectPaths,
    status: &SessionStatus,
) -> Result<(), StoreError> {
    write_json_locked(&paths.session_status_file(status.session_id.as_str()), status)
}

pub fn get_session_status(
    paths: &ProjectPaths,
    id: &SessionId,
) -> Result<SessionStatus, StoreError> {
    let path = paths.session_status_file(id.as_str());
    read_json(&path).map_err(|e| match e {
        StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            StoreError::NotFound(id.to_string())
        }
        other => other,
    })
}

pub fn try_get_session_status(
    paths: &ProjectPaths,
    id: &SessionId,
) -> Result<Option<SessionStatus>, StoreError> {
    read_json_opt(&paths.session_status_file(id.as_str()))
}

pub fn list_session_statuses(paths: &ProjectPaths) -> Result<Vec<SessionStatus>, StoreError> {
    let dir = paths.sessions_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut statuses = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
        let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        let status_path = entry.path().join("status.json");
        if let Some(status) = read_json_opt(&status_path)? {
            statuses.push(status);
        }
    }
    statuses.sort_by(|a: &SessionStatus, b: &SessionStatus| a.session_id.as_str().cmp(b.session_id.as_str()));
    Ok(statuses)
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
