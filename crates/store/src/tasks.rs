// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task records, one file per task under `tasks/<id>.json`.

use std::fs;

use warden_core::{CoreError, Task, TaskId, TaskStatus};

use crate::atomic::{read_json, write_json_atomic, RecordLock};
use crate::error::StoreError;
use crate::layout::ProjectPaths;

pub fn create_task(paths: &ProjectPaths, task: &Task) -> Result<(), StoreError> {
    let path = paths.task_file(task.id.as_str());
    if path.exists() {
        return Err(StoreError::io(
            &path,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "task already exists"),
        ));
    }
    write_json_atomic(&path, task)
}

pub fn get_task(paths: &ProjectPaths, id: &TaskId) -> Result<Task, StoreError> {
    let path = paths.task_file(id.as_str());
    read_json(&path).map_err(|e| match e {
        StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            StoreError::NotFound(id.to_string())
        }
        other => other,
    })
}

pub fn list_tasks(paths: &ProjectPaths) -> Result<Vec<Task>, StoreError> {
    let dir = paths.tasks_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut tasks = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
        let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        tasks.push(read_json(&path)?);
    }
    tasks.sort_by(|a: &Task, b: &Task| a.id.as_str().cmp(b.id.as_str()));
    Ok(tasks)
}

/// Claim the first pending task whose dependencies are all complete, under
/// the task's own lock so two workers racing `claim_task` can't both win.
pub fn claim_task(
    paths: &ProjectPaths,
    id: &TaskId,
    owner: &str,
    now_ms: u64,
) -> Result<Task, StoreError> {
    let path = paths.task_file(id.as_str());
    let _lock = RecordLock::acquire(&path)?;
    let mut task: Task = read_json(&path)?;
    task.claim(owner, now_ms).map_err(|e| core_error_to_store(&path, e))?;
    write_json_atomic(&path, &task)?;
    Ok(task)
}

pub fn complete_task(
    paths: &ProjectPaths,
    id: &TaskId,
    caller: &str,
    summary: impl Into<String>,
    files_changed: Vec<String>,
    now_ms: u64,
) -> Result<Task, StoreError> {
    let path = paths.task_file(id.as_str());
    let _lock = RecordLock::acquire(&path)?;
    let mut task: Task = read_json(&path)?;
    task.complete(caller, summary, files_changed, now_ms).map_err(|e| core_error_to_store(&path, e))?;
    write_json_atomic(&path, &task)?;
    Ok(task)
}

pub fn fail_task(
    paths: &ProjectPaths,
    id: &TaskId,
    summary: impl Into<String>,
    now_ms: u64,
) -> Result<Task, StoreError> {
    let path = paths.task_file(id.as_str());
    let _lock = RecordLock::acquire(&path)?;
    let mut task: Task = read_json(&path)?;
    task.fail(summary, now_ms);
    write_json_atomic(&path, &task)?;
    Ok(task)
}

/// Sweep every `in_progress` task and reset it to `pending`, clearing its
/// owner. Run once at startup before resuming a crashed run: the worker that
/// held these tasks is gone, so their claim is no longer valid.
pub fn reset_orphans(paths: &ProjectPaths) -> Result<Vec<TaskId>, StoreError> {
    reset_orphans_not_owned_by(paths, &std::collections::HashSet::new())
}

/// Sweep `in_progress` tasks whose owner is not in `active_session_ids`,
/// resetting them to `pending`. Used during steady-state operation (the
/// supervisor's periodic orphan recovery), where most `in_progress` tasks
/// are legitimately owned by still-running workers and must be left alone —
/// unlike `reset_orphans`, which runs once at load time when every worker
/// from the prior process is presumed gone.
pub fn reset_orphans_not_owned_by(
    paths: &ProjectPaths,
    active_session_ids: &std::collections::HashSet<String>,
) -> Result<Vec<TaskId>, StoreError> {
    let mut reset = Vec::new();
    for mut task in list_tasks(paths)? {
        if task.status != TaskStatus::InProgress {
            continue;
        }
        if task.owner.as_deref().is_some_and(|owner| active_session_ids.contains(owner)) {
            continue;
        }
        let path = paths.task_file(task.id.as_str());
        let _lock = RecordLock::acquire(&path)?;
        task.reset_orphan();
        write_json_atomic(&path, &task)?;
        reset.push(task.id.clone());
    }
    Ok(reset)
}

fn core_error_to_store(path: &std::path::Path, e: CoreError) -> StoreError {
    StoreError::io(path, std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
