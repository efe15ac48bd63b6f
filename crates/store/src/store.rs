// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level project store: owns the `.warden/` lock for the life of the
//! process and wires together the per-record modules below it.

use std::fs;
use std::fs::OpenOptions;
use std::io::Write as _;

use fs2::FileExt;
use warden_core::RunState;

use crate::error::StoreError;
use crate::layout::ProjectPaths;
use crate::{run_state, tasks};

/// Holds the project-wide lock file for as long as this process is the
/// active orchestrator for the project. Dropping it releases the lock —
/// mirrored on the lock-file PID-write ordering used at daemon startup:
/// open without truncating, lock, only then truncate and write our pid.
pub struct Store {
    paths: ProjectPaths,
    _lock_file: fs::File,
}

impl Store {
    /// Create a brand-new `.warden/` directory tree and take the lock. Fails
    /// if one already exists.
    pub fn init(project_root: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        let paths = ProjectPaths::new(project_root.into());
        if paths.root().exists() {
            return Err(StoreError::AlreadyInitialized(paths.root().to_path_buf()));
        }
        for dir in paths.all_dirs() {
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        let lock_file = acquire_project_lock(&paths)?;
        Ok(Self { paths, _lock_file: lock_file })
    }

    /// Open an existing `.warden/` directory tree, taking the lock and
    /// resetting any task left `in_progress` by a crashed prior run.
    pub fn load(project_root: impl Into<std::path::PathBuf>) -> Result<(Self, RunState), StoreError> {
        let paths = ProjectPaths::new(project_root.into());
        if !paths.root().exists() {
            return Err(StoreError::NotInitialized(paths.root().to_path_buf()));
        }
        let lock_file = acquire_project_lock(&paths)?;
        let state = run_state::load_run_state(&paths)?
            .ok_or_else(|| StoreError::NotInitialized(paths.root().to_path_buf()))?;
        tasks::reset_orphans(&paths)?;
        Ok((Self { paths, _lock_file: lock_file }, state))
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }
}

fn acquire_project_lock(paths: &ProjectPaths) -> Result<fs::File, StoreError> {
    let lock_path = paths.lock_file();
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| StoreError::io(&lock_path, e))?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| StoreError::LockTimeout { path: lock_path.clone(), attempts: 0 })?;

    let mut lock_file = lock_file;
    lock_file.set_len(0).map_err(|e| StoreError::io(&lock_path, e))?;
    writeln!(lock_file, "{}", std::process::id()).map_err(|e| StoreError::io(&lock_path, e))?;
    Ok(lock_file)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
