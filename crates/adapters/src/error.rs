// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced by every external-collaborator adapter in this crate.
///
/// Deliberately coarse: callers (the Reviewer Driver, Budget Monitor, Cycle
/// Engine) classify retryability themselves rather than matching on fine
/// subvariants here, per the retry-classification design in the engine.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("process execution failed: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("process timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("unparseable output: {0}")]
    Parse(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("non-zero exit ({code}): {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}
