// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The singleton `state.json` record.

use warden_core::RunState;

use crate::atomic::{read_json_opt, write_json_locked};
use crate::error::StoreError;
use crate::layout::ProjectPaths;

pub fn load_run_state(paths: &ProjectPaths) -> Result<Option<RunState>, StoreError> {
    read_json_opt(&paths.state_file())
}

pub fn save_run_state(paths: &ProjectPaths, state: &RunState) -> Result<(), StoreError> {
    write_json_locked(&paths.state_file(), state)
}

#[cfg(test)]
#[path = "run_state_tests.rs"]
mod tests;
