// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered configuration: built-in defaults, overridden by `warden.toml` in
//! the project root, overridden by CLI flags. Every numeric knob named in
//! the cycle engine's design has a named default here rather than a bare
//! literal scattered through the engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub concurrency: u32,
    pub cycle_cap: u32,
    pub wind_down_threshold: f64,
    pub critical_threshold: f64,
    pub resume_threshold: f64,
    pub usage_poll_secs: u64,
    pub engine_poll_secs: u64,
    pub reviewer_timeout_secs: u64,
    pub reviewer_max_rounds: u32,
    pub orphan_grace_secs: u64,
    pub issue_recurrence_threshold: u32,
    pub max_flows_per_cycle: usize,
    pub flow_trace_parallelism: usize,
    pub test_command: String,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            cycle_cap: 20,
            wind_down_threshold: 0.80,
            critical_threshold: 0.90,
            resume_threshold: 0.50,
            usage_poll_secs: 30,
            engine_poll_secs: 5,
            reviewer_timeout_secs: 5 * 60,
            reviewer_max_rounds: 5,
            orphan_grace_secs: 2 * 60,
            issue_recurrence_threshold: 2,
            max_flows_per_cycle: 8,
            flow_trace_parallelism: 3,
            test_command: "cargo test".to_string(),
        }
    }
}

impl WardenConfig {
    /// Merge in a partially-specified file layer; every field present in
    /// `file` overrides the built-in default, absent fields keep it.
    pub fn merge_file(mut self, file: PartialWardenConfig) -> Self {
        macro_rules! apply {
            ($field:ident) => {
                if let Some(v) = file.$field {
                    self.$field = v;
                }
            };
        }
        apply!(concurrency);
        apply!(cycle_cap);
        apply!(wind_down_threshold);
        apply!(critical_threshold);
        apply!(resume_threshold);
        apply!(usage_poll_secs);
        apply!(engine_poll_secs);
        apply!(reviewer_timeout_secs);
        apply!(reviewer_max_rounds);
        apply!(orphan_grace_secs);
        apply!(issue_recurrence_threshold);
        apply!(max_flows_per_cycle);
        apply!(flow_trace_parallelism);
        apply!(test_command);
        self
    }

    pub fn usage_poll_interval(&self) -> Duration {
        Duration::from_secs(self.usage_poll_secs)
    }

    pub fn engine_poll_interval(&self) -> Duration {
        Duration::from_secs(self.engine_poll_secs)
    }

    pub fn reviewer_timeout(&self) -> Duration {
        Duration::from_secs(self.reviewer_timeout_secs)
    }

    pub fn orphan_grace(&self) -> Duration {
        Duration::from_secs(self.orphan_grace_secs)
    }

    /// Load `<project>/warden.toml` if present, falling back to defaults.
    pub fn load(project_dir: &std::path::Path) -> Result<Self, crate::error::OrchestratorError> {
        let path = project_dir.join("warden.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        let partial: PartialWardenConfig =
            toml::from_str(&text).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::default().merge_file(partial))
    }
}

/// Every field optional: a `warden.toml` only needs to name the knobs it
/// wants to override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialWardenConfig {
    pub concurrency: Option<u32>,
    pub cycle_cap: Option<u32>,
    pub wind_down_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
    pub resume_threshold: Option<f64>,
    pub usage_poll_secs: Option<u64>,
    pub engine_poll_secs: Option<u64>,
    pub reviewer_timeout_secs: Option<u64>,
    pub reviewer_max_rounds: Option<u32>,
    pub orphan_grace_secs: Option<u64>,
    pub issue_recurrence_threshold: Option<u32>,
    pub max_flows_per_cycle: Option<usize>,
    pub flow_trace_parallelism: Option<usize>,
    pub test_command: Option<String>,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
