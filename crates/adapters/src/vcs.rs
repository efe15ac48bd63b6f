// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git operations the Cycle Engine needs for checkpointing and diff-scoped
//! review/flow-tracing, behind a trait so tests never shell out.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;

use crate::error::AdapterError;

#[async_trait]
pub trait VcsFacade: Send + Sync + 'static {
    async fn create_branch(&self, name: &str) -> Result<(), AdapterError>;
    async fn checkout(&self, name: &str) -> Result<(), AdapterError>;
    async fn is_detached_head(&self) -> Result<bool, AdapterError>;
    async fn head_sha(&self) -> Result<String, AdapterError>;
    async fn diff_against(&self, base: &str) -> Result<String, AdapterError>;
    async fn changed_files(&self, base: &str) -> Result<Vec<String>, AdapterError>;
    async fn commit(&self, message: &str) -> Result<String, AdapterError>;
    async fn pull_rebase(&self) -> Result<(), AdapterError>;
}

pub struct GitVcsFacade {
    repo_dir: PathBuf,
}

impl GitVcsFacade {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self { repo_dir: repo_dir.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, AdapterError> {
        tokio::process::Command::new("git")
            .current_dir(&self.repo_dir)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AdapterError::ToolNotFound("git".to_string())
                } else {
                    AdapterError::Spawn(e)
                }
            })
    }

    async fn run_text(&self, args: &[&str]) -> Result<String, AdapterError> {
        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(AdapterError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl VcsFacade for GitVcsFacade {
    async fn create_branch(&self, name: &str) -> Result<(), AdapterError> {
        self.run_text(&["checkout", "-b", name]).await.map(|_| ())
    }

    async fn checkout(&self, name: &str) -> Result<(), AdapterError> {
        self.run_text(&["checkout", name]).await.map(|_| ())
    }

    async fn is_detached_head(&self) -> Result<bool, AdapterError> {
        let branch = self.run_text(&["symbolic-ref", "-q", "--short", "HEAD"]).await;
        Ok(branch.is_err())
    }

    async fn head_sha(&self) -> Result<String, AdapterError> {
        self.run_text(&["rev-parse", "HEAD"]).await
    }

    async fn diff_against(&self, base: &str) -> Result<String, AdapterError> {
        self.run_text(&["diff", base]).await
    }

    async fn changed_files(&self, base: &str) -> Result<Vec<String>, AdapterError> {
        let out = self.run_text(&["diff", "--name-only", base]).await?;
        Ok(out.lines().map(str::to_string).collect())
    }

    async fn commit(&self, message: &str) -> Result<String, AdapterError> {
        self.run_text(&["add", "-A"]).await?;
        self.run_text(&["commit", "-m", message]).await?;
        self.head_sha().await
    }

    async fn pull_rebase(&self) -> Result<(), AdapterError> {
        self.run_text(&["pull", "--rebase"]).await.map(|_| ())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;

    #[derive(Debug, Default, Clone)]
    struct FakeVcsState {
        branch: String,
        detached: bool,
        head_sha: String,
        commits: Vec<String>,
        changed_files: Vec<String>,
    }

    #[derive(Clone)]
    pub struct FakeVcsFacade {
        inner: Arc<Mutex<FakeVcsState>>,
    }

    impl Default for FakeVcsFacade {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeVcsState {
                    branch: "main".to_string(),
                    detached: false,
                    head_sha: "0".repeat(40),
                    commits: Vec::new(),
                    changed_files: Vec::new(),
                })),
            }
        }
    }

    impl FakeVcsFacade {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_changed_files(&self, files: Vec<String>) {
            self.inner.lock().changed_files = files;
        }

        pub fn commits(&self) -> Vec<String> {
            self.inner.lock().commits.clone()
        }
    }

    #[async_trait]
    impl VcsFacade for FakeVcsFacade {
        async fn create_branch(&self, name: &str) -> Result<(), AdapterError> {
            let mut inner = self.inner.lock();
            inner.branch = name.to_string();
            inner.detached = false;
            Ok(())
        }

        async fn checkout(&self, name: &str) -> Result<(), AdapterError> {
            let mut inner = self.inner.lock();
            inner.branch = name.to_string();
            inner.detached = false;
            Ok(())
        }

        async fn is_detached_head(&self) -> Result<bool, AdapterError> {
            Ok(self.inner.lock().detached)
        }

        async fn head_sha(&self) -> Result<String, AdapterError> {
            Ok(self.inner.lock().head_sha.clone())
        }

        async fn diff_against(&self, _base: &str) -> Result<String, AdapterError> {
            Ok(String::new())
        }

        async fn changed_files(&self, _base: &str) -> Result<Vec<String>, AdapterError> {
            Ok(self.inner.lock().changed_files.clone())
        }

        async fn commit(&self, message: &str) -> Result<String, AdapterError> {
            let mut inner = self.inner.lock();
            inner.commits.push(message.to_string());
            inner.head_sha = format!("{:040x}", inner.commits.len());
            Ok(inner.head_sha.clone())
        }

        async fn pull_rebase(&self) -> Result<(), AdapterError> {
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeVcsFacade;

#[cfg(test)]
#[path = "vcs_tests.rs"]
mod tests;
