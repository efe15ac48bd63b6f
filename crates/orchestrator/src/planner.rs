// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invokes the planning LLM through the same exec contract the Reviewer
//! Driver uses, then derives a task DAG from its fenced JSON reply: each
//! declared task gets a monotone id in declaration order, and
//! `depends_on_subjects` resolve against the other tasks in the same plan.
//! An unresolved subject is dropped with a warning rather than failing the
//! whole plan.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use warden_adapters::{AdapterError, ReviewerTool};
use warden_core::{RiskLevel, Task, TaskId, TaskType};

#[derive(Debug, Deserialize)]
struct RawTaskDef {
    subject: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    depends_on_subjects: Vec<String>,
    #[serde(default)]
    task_type: Option<TaskType>,
    #[serde(default)]
    risk_level: Option<RiskLevel>,
    #[serde(default)]
    security_requirements: Vec<String>,
    #[serde(default)]
    performance_requirements: Vec<String>,
    #[serde(default)]
    acceptance_criteria: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    tasks: Vec<RawTaskDef>,
}

fn parse_raw_plan(stdout: &str) -> Option<RawPlan> {
    let fence_start = stdout.find("```json")?;
    let after = &stdout[fence_start + "```json".len()..];
    let fence_end = after.find("```")?;
    serde_json::from_str(after[..fence_end].trim()).ok()
}

pub struct PlanOutput {
    pub plan_text: String,
    pub tasks: Vec<Task>,
    pub warnings: Vec<String>,
}

/// Assign ids and resolve dependency subjects against each other, mirroring
/// `depends_on` into `blocks` so `validate_dag` (and the store's `blocks`
/// invariant) hold without a second pass.
fn derive_tasks(raw_tasks: Vec<RawTaskDef>, next_id: u32, now_ms: u64) -> (Vec<Task>, Vec<String>) {
    let ids: Vec<TaskId> = (0..raw_tasks.len() as u32).map(|offset| TaskId::sequential(next_id + offset)).collect();
    let id_by_subject: HashMap<&str, &TaskId> =
        raw_tasks.iter().zip(&ids).map(|(raw, id)| (raw.subject.as_str(), id)).collect();

    let mut warnings = Vec::new();
    let mut tasks: Vec<Task> = raw_tasks
        .iter()
        .zip(ids)
        .map(|(raw, id)| {
            let mut task = Task::new(id, raw.subject.clone(), raw.task_type.unwrap_or(TaskType::General), now_ms);
            task.description = raw.description.clone();
            task.security_requirements = raw.security_requirements.clone();
            task.performance_requirements = raw.performance_requirements.clone();
            task.acceptance_criteria = raw.acceptance_criteria.clone();
            if let Some(risk) = raw.risk_level {
                task.risk_level = risk;
            }
            for subject in &raw.depends_on_subjects {
                match id_by_subject.get(subject.as_str()) {
                    Some(dep_id) if **dep_id != task.id => {
                        task.depends_on.insert((*dep_id).clone());
                    }
                    Some(_) => {}
                    None => warnings.push(format!(
                        "task `{}` depends on unresolved subject `{subject}`, dropping the edge",
                        task.subject
                    )),
                }
            }
            task
        })
        .collect();

    let blocks_edges: Vec<(TaskId, TaskId)> =
        tasks.iter().flat_map(|t| t.depends_on.iter().map(|dep| (dep.clone(), t.id.clone()))).collect();
    for (dependency, dependent) in blocks_edges {
        if let Some(dep_task) = tasks.iter_mut().find(|t| t.id == dependency) {
            dep_task.blocks.insert(dependent);
        }
    }

    (tasks, warnings)
}

/// Run the planning LLM and derive the next batch of tasks. `next_id` is the
/// first id to assign, the caller's running task-sequence counter. Returns
/// `Ok(None)` when the reply carries no parseable task block — the engine
/// treats that as the fatal, per-cycle "planner produced no tasks" case.
pub async fn run_planning(
    tool: &dyn ReviewerTool,
    project_dir: &Path,
    prompt: &str,
    timeout: Duration,
    next_id: u32,
    now_ms: u64,
) -> Result<Option<PlanOutput>, AdapterError> {
    let run = tool.run(project_dir, prompt, timeout).await?;
    let Some(raw) = parse_raw_plan(&run.stdout) else { return Ok(None) };
    let (tasks, warnings) = derive_tasks(raw.tasks, next_id, now_ms);
    Ok(Some(PlanOutput { plan_text: run.stdout, tasks, warnings }))
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
