// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout under `<project>/.warden/`.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self { root: project_root.into().join(".warden") }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join("lock")
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn plan_file(&self, version: u32) -> PathBuf {
        self.root.join(format!("plan-v{version}.md"))
    }

    pub fn conventions_file(&self) -> PathBuf {
        self.root.join("conventions.json")
    }

    pub fn known_issues_file(&self) -> PathBuf {
        self.root.join("known-issues.json")
    }

    pub fn escalation_file(&self) -> PathBuf {
        self.root.join("escalation.json")
    }

    pub fn pause_signal_file(&self) -> PathBuf {
        self.root.join("pause.signal")
    }

    pub fn decisions_file(&self) -> PathBuf {
        self.root.join("decisions.jsonl")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    pub fn task_file(&self, task_id: &str) -> PathBuf {
        self.tasks_dir().join(format!("{task_id}.json"))
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(session_id)
    }

    pub fn session_status_file(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join("status.json")
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.root.join("messages")
    }

    pub fn message_log_file(&self, session_id: &str) -> PathBuf {
        self.messages_dir().join(format!("{session_id}.jsonl"))
    }

    pub fn contracts_dir(&self) -> PathBuf {
        self.root.join("contracts")
    }

    pub fn contract_file(&self, contract_id: &str) -> PathBuf {
        self.contracts_dir().join(format!("{contract_id}.json"))
    }

    pub fn flow_tracing_dir(&self) -> PathBuf {
        self.root.join("flow-tracing")
    }

    pub fn flow_report_file(&self, cycle: u32) -> PathBuf {
        self.flow_tracing_dir().join(format!("report-cycle-{cycle}.json"))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn log_file(&self, name: &str) -> PathBuf {
        self.logs_dir().join(format!("{name}.log"))
    }

    /// All the top-level subdirectories `init` must create.
    pub fn all_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.root.clone(),
            self.tasks_dir(),
            self.sessions_dir(),
            self.messages_dir(),
            self.contracts_dir(),
            self.flow_tracing_dir(),
            self.logs_dir(),
        ]
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
