// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invokes an external reviewer CLI in read-only sandbox mode and hands back
//! its raw output for the Reviewer Driver to interpret.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AdapterError;

/// Raw result of one reviewer CLI invocation. Deliberately untyped past this
/// point: whether the run produced a real verdict, no verdict, or signals a
/// rate limit is a Reviewer Driver decision, not an adapter one.
#[derive(Debug, Clone)]
pub struct ReviewerRun {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

#[async_trait]
pub trait ReviewerTool: Send + Sync + 'static {
    /// Run `<tool> exec --full-auto --sandbox read-only -C <project_dir> <prompt>`,
    /// bounded by `timeout`. Never returns `Err` for a crashed or rate-limited
    /// subprocess — those surface as a run with `timed_out` set or a non-zero
    /// `exit_code`; `Err` is reserved for the tool binary being absent.
    async fn run(
        &self,
        project_dir: &Path,
        prompt: &str,
        timeout: Duration,
    ) -> Result<ReviewerRun, AdapterError>;
}

/// Extracts the fenced ```json ... ``` block the reviewer CLI is instructed
/// to emit and parses it into a [`warden_core::ReviewResult`]. Returns `None`
/// if no fenced block is present or it doesn't parse — the caller treats that
/// as an unparseable-output outcome.
pub fn parse_review_json(stdout: &str) -> Option<warden_core::ReviewResult> {
    let fence_start = stdout.find("```json")?;
    let after_fence = &stdout[fence_start + "```json".len()..];
    let fence_end = after_fence.find("```")?;
    let body = after_fence[..fence_end].trim();
    serde_json::from_str(body).ok()
}

pub struct CliReviewerTool {
    pub tool_path: std::path::PathBuf,
}

impl CliReviewerTool {
    pub fn new(tool_path: impl Into<std::path::PathBuf>) -> Self {
        Self { tool_path: tool_path.into() }
    }
}

#[async_trait]
impl ReviewerTool for CliReviewerTool {
    async fn run(
        &self,
        project_dir: &Path,
        prompt: &str,
        timeout: Duration,
    ) -> Result<ReviewerRun, AdapterError> {
        let mut command = tokio::process::Command::new(&self.tool_path);
        command
            .arg("exec")
            .arg("--full-auto")
            .arg("--sandbox")
            .arg("read-only")
            .arg("-C")
            .arg(project_dir)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdapterError::ToolNotFound(self.tool_path.display().to_string())
            } else {
                AdapterError::Spawn(e)
            }
        })?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ReviewerRun {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
                timed_out: false,
            }),
            Ok(Err(e)) => Err(AdapterError::Spawn(e)),
            Err(_) => Ok(ReviewerRun {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: None,
                timed_out: true,
            }),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;

    #[derive(Debug, Clone)]
    pub struct ReviewerCall {
        pub project_dir: std::path::PathBuf,
        pub prompt: String,
    }

    struct FakeState {
        calls: Vec<ReviewerCall>,
        responses: std::collections::VecDeque<ReviewerRun>,
    }

    /// Fake reviewer tool that replays a fixed queue of canned responses, one
    /// per call, falling back to a no-verdict run once exhausted.
    #[derive(Clone)]
    pub struct FakeReviewerTool {
        inner: Arc<Mutex<FakeState>>,
    }

    impl Default for FakeReviewerTool {
        fn default() -> Self {
            Self { inner: Arc::new(Mutex::new(FakeState { calls: Vec::new(), responses: Default::default() })) }
        }
    }

    impl FakeReviewerTool {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, run: ReviewerRun) {
            self.inner.lock().responses.push_back(run);
        }

        pub fn calls(&self) -> Vec<ReviewerCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl ReviewerTool for FakeReviewerTool {
        async fn run(
            &self,
            project_dir: &Path,
            prompt: &str,
            _timeout: Duration,
        ) -> Result<ReviewerRun, AdapterError> {
            let mut inner = self.inner.lock();
            inner.calls.push(ReviewerCall { project_dir: project_dir.to_path_buf(), prompt: prompt.to_string() });
            Ok(inner.responses.pop_front().unwrap_or(ReviewerRun {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: Some(0),
                timed_out: false,
            }))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeReviewerTool, ReviewerCall};

#[cfg(test)]
#[path = "reviewer_tests.rs"]
mod tests;
