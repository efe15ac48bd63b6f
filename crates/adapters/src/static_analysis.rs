// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs semgrep and parses its JSON findings.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AdapterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFinding {
    pub check_id: String,
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub message: String,
    pub severity: String,
}

#[async_trait]
pub trait StaticAnalysisTool: Send + Sync + 'static {
    /// Run `semgrep --json --config=<config> <paths...>` against `project_dir`.
    /// Semgrep exits 1 when findings are present and stdout is still valid
    /// JSON — that case is treated as success, not an error.
    async fn scan(
        &self,
        project_dir: &Path,
        config: &str,
        paths: &[String],
    ) -> Result<Vec<StaticFinding>, AdapterError>;
}

#[derive(Deserialize)]
struct SemgrepOutput {
    results: Vec<SemgrepResult>,
}

#[derive(Deserialize)]
struct SemgrepResult {
    check_id: String,
    path: String,
    start: SemgrepPos,
    end: SemgrepPos,
    extra: SemgrepExtra,
}

#[derive(Deserialize)]
struct SemgrepPos {
    line: u32,
}

#[derive(Deserialize)]
struct SemgrepExtra {
    message: String,
    severity: String,
}

pub fn parse_semgrep_json(stdout: &str) -> Result<Vec<StaticFinding>, AdapterError> {
    let parsed: SemgrepOutput =
        serde_json::from_str(stdout).map_err(|e| AdapterError::Parse(e.to_string()))?;
    Ok(parsed
        .results
        .into_iter()
        .map(|r| StaticFinding {
            check_id: r.check_id,
            path: r.path,
            start_line: r.start.line,
            end_line: r.end.line,
            message: r.extra.message,
            severity: r.extra.severity,
        })
        .collect())
}

pub struct SemgrepTool {
    pub binary_path: PathBuf,
}

impl SemgrepTool {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self { binary_path: binary_path.into() }
    }
}

#[async_trait]
impl StaticAnalysisTool for SemgrepTool {
    async fn scan(
        &self,
        project_dir: &Path,
        config: &str,
        paths: &[String],
    ) -> Result<Vec<StaticFinding>, AdapterError> {
        let mut command = tokio::process::Command::new(&self.binary_path);
        command
            .current_dir(project_dir)
            .arg("--json")
            .arg(format!("--config={config}"))
            .args(paths)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdapterError::ToolNotFound(self.binary_path.display().to_string())
            } else {
                AdapterError::Spawn(e)
            }
        })?;

        // semgrep: 0 = no findings, 1 = findings present (still valid JSON on
        // stdout), anything else is a genuine failure.
        match output.status.code() {
            Some(0) | Some(1) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                parse_semgrep_json(&stdout)
            }
            Some(code) => Err(AdapterError::NonZeroExit {
                code,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            None => Err(AdapterError::NonZeroExit { code: -1, stderr: "terminated by signal".into() }),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    pub struct FakeStaticAnalysisTool {
        findings: Arc<Mutex<Vec<StaticFinding>>>,
        calls: Arc<Mutex<u32>>,
    }

    impl FakeStaticAnalysisTool {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_findings(&self, findings: Vec<StaticFinding>) {
            *self.findings.lock() = findings;
        }

        pub fn call_count(&self) -> u32 {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl StaticAnalysisTool for FakeStaticAnalysisTool {
        async fn scan(
            &self,
            _project_dir: &Path,
            _config: &str,
            _paths: &[String],
        ) -> Result<Vec<StaticFinding>, AdapterError> {
            *self.calls.lock() += 1;
            Ok(self.findings.lock().clone())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStaticAnalysisTool;

#[cfg(test)]
#[path = "static_analysis_tests.rs"]
mod tests;
