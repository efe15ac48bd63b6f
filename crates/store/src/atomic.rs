// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-record advisory locking and atomic write-temp-then-rename helpers.
//!
//! Every mutation to a record on disk takes an exclusive `fs2` lock on a
//! sibling `.lock` file before reading, and writes through a `.tmp` file
//! renamed into place so a reader never observes a partial write.

use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

const LOCK_RETRIES: u32 = 3;
const LOCK_BACKOFF: Duration = Duration::from_millis(100);

fn lock_path_for(path: &Path) -> PathBuf {
    let mut lock = path.as_os_str().to_owned();
    lock.push(".lock");
    PathBuf::from(lock)
}

/// Holds an exclusive advisory lock on `path.lock` for the lifetime of the
/// guard. Dropping it releases the lock.
pub struct RecordLock {
    _file: File,
}

impl RecordLock {
    /// Acquire the lock, retrying with backoff if another process holds it.
    pub fn acquire(path: &Path) -> Result<Self, StoreError> {
        let lock_path = lock_path_for(path);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::io(&lock_path, e))?;

        let mut attempt = 0;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { _file: file }),
                Err(_) if attempt < LOCK_RETRIES => {
                    attempt += 1;
                    thread::sleep(LOCK_BACKOFF);
                }
                Err(_) => {
                    return Err(StoreError::LockTimeout { path: lock_path, attempts: attempt })
                }
            }
        }
    }
}

/// Write `value` to `path` atomically: serialize to a sibling `.tmp` file,
/// flush, then rename over the destination.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let tmp_path = path.with_extension("tmp");
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::json(path, e))?;
    {
        let mut tmp = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        tmp.write_all(&bytes).map_err(|e| StoreError::io(&tmp_path, e))?;
        tmp.sync_all().map_err(|e| StoreError::io(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::json(path, e))
}

pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(read_json(path)?))
}

/// Write `value` to `path` atomically while holding the record's lock, so
/// concurrent writers serialize instead of racing the rename.
pub fn write_json_locked<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let _lock = RecordLock::acquire(path)?;
    write_json_atomic(path, value)
}

/// Append one JSON-encoded line to `path`, holding the record's lock for the
/// duration of the append. Used for append-only logs (messages, decisions).
pub fn append_jsonl_locked<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let _lock = RecordLock::acquire(path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let mut line = serde_json::to_string(value).map_err(|e| StoreError::json(path, e))?;
    line.push('\n');
    let mut file =
        OpenOptions::new().create(true).append(true).open(path).map_err(|e| StoreError::io(path, e))?;
    file.write_all(line.as_bytes()).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(|e| StoreError::json(path, e)))
        .collect()
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
