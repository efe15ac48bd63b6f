// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatches one coordination-service verb against the durable store. Pure
//! request-in, response-out: no socket or subprocess knowledge lives here,
//! so it's testable without spawning anything.

use warden_core::{ArchitecturalDecision, Message, MessageType, Task, TaskStatus};
use warden_store::{contracts, decisions, messages, run_state, sessions, tasks, ProjectPaths, StoreError};
use warden_wire::{DependencySummary, Request, RequestErrorKind, Response};

/// Verify every dependency of `task_id` is `Completed` before attempting the
/// claim. Safe to check before acquiring the task's own lock: `Completed`
/// is terminal, so a dependency can't un-complete itself between this check
/// and the claim that follows — the only race that matters (two workers
/// claiming the same task) is still serialized by `tasks::claim_task`'s own
/// per-record lock.
fn check_dependencies_completed(paths: &ProjectPaths, task: &Task) -> Result<(), RequestErrorKind> {
    for dep_id in &task.depends_on {
        match tasks::get_task(paths, dep_id) {
            Ok(dep) if dep.status == TaskStatus::Completed => continue,
            Ok(dep) => {
                return Err(RequestErrorKind::DependencyNotCompleted {
                    task_id: task.id.clone(),
                    dependency: dep.id,
                })
            }
            Err(_) => {
                return Err(RequestErrorKind::DependencyNotCompleted {
                    task_id: task.id.clone(),
                    dependency: dep_id.clone(),
                })
            }
        }
    }
    Ok(())
}

fn store_error_response(task_id: warden_core::TaskId, err: StoreError) -> Response {
    let message = err.to_string();
    let kind = match err {
        StoreError::NotFound(_) => RequestErrorKind::TaskNotFound { task_id },
        _ => RequestErrorKind::TestRunFailed { reason: message.clone() },
    };
    Response::Error { error: kind, message }
}

pub async fn dispatch(
    paths: &ProjectPaths,
    caller_session_id: &str,
    request: Request,
    now_ms: u64,
    test_command: &str,
) -> Response {
    match request {
        Request::ListTasks { status } => match tasks::list_tasks(paths) {
            Ok(all) => {
                let filtered = match status {
                    Some(s) => all.into_iter().filter(|t| t.status == s).collect(),
                    None => all,
                };
                Response::Tasks { tasks: filtered }
            }
            Err(e) => Response::Error { error: RequestErrorKind::TestRunFailed { reason: e.to_string() }, message: e.to_string() },
        },

        Request::ClaimTask { task_id } => {
            let task = match tasks::get_task(paths, &task_id) {
                Ok(t) => t,
                Err(e) => return store_error_response(task_id, e),
            };
            if task.status != TaskStatus::Pending {
                return Response::Error {
                    error: RequestErrorKind::TaskNotPending { task_id, current: task.status.to_string() },
                    message: "task is not pending".to_string(),
                };
            }
            if let Err(kind) = check_dependencies_completed(paths, &task) {
                return Response::Error { message: format!("{kind:?}"), error: kind };
            }
            match tasks::claim_task(paths, &task_id, caller_session_id, now_ms) {
                Ok(claimed) => {
                    let dependency_context = claimed
                        .depends_on
                        .iter()
                        .filter_map(|id| tasks::get_task(paths, id).ok())
                        .map(|dep| DependencySummary {
                            task_id: dep.id,
                            summary: dep.result_summary,
                            files_changed: dep.files_changed,
                        })
                        .collect();
                    let in_progress = tasks::list_tasks(paths)
                        .unwrap_or_default()
                        .into_iter()
                        .filter(|t| t.status == TaskStatus::InProgress && t.id != claimed.id)
                        .map(|t| t.id.to_string())
                        .collect();
                    let all_contracts = contracts::list_contracts(paths).unwrap_or_default();
                    let all_decisions = decisions::list_decisions(paths).unwrap_or_default();
                    Response::TaskClaimed {
                        task: Box::new(claimed),
                        dependency_context,
                        in_progress,
                        contracts: all_contracts,
                        decisions: all_decisions,
                        warnings: Vec::new(),
                    }
                }
                Err(e) => store_error_response(task_id, e),
            }
        }

        Request::CompleteTask { task_id, summary, files_changed } => {
            match tasks::complete_task(paths, &task_id, caller_session_id, summary, files_changed, now_ms) {
                Ok(task) => Response::TaskCompleted { task: Box::new(task) },
                Err(e) => store_error_response(task_id, e),
            }
        }

        Request::ReadUpdates { since_ms } => match messages::read_updates_for(paths, caller_session_id, since_ms) {
            Ok(messages) => Response::Updates { messages },
            Err(e) => Response::Error { error: RequestErrorKind::TestRunFailed { reason: e.to_string() }, message: e.to_string() },
        },

        Request::PostUpdate { message_type, content, to } => {
            let mut message = Message::new(caller_session_id, message_type, content, now_ms);
            message.to = to;
            match messages::post_message(paths, caller_session_id, &message) {
                Ok(()) => Response::UpdatePosted { message: Box::new(message) },
                Err(e) => Response::Error { error: RequestErrorKind::TestRunFailed { reason: e.to_string() }, message: e.to_string() },
            }
        }

        Request::GetSessionStatus { session_id } => {
            let id = warden_core::SessionId::from_string(session_id.clone());
            match sessions::try_get_session_status(paths, &id) {
                Ok(status) => Response::SessionStatus { status: status.map(Box::new) },
                Err(e) => Response::Error { error: RequestErrorKind::SessionNotFound { session_id }, message: e.to_string() },
            }
        }

        Request::RegisterContract { id, contract_type, specification } => {
            let contract = warden_core::Contract {
                id: warden_core::ContractId::new(id),
                contract_type,
                specification,
                owning_task: caller_session_id.to_string(),
                registered_at_ms: now_ms,
            };
            match contracts::register_contract(paths, &contract) {
                Ok(()) => Response::ContractRegistered { contract: Box::new(contract) },
                Err(e) => Response::Error { error: RequestErrorKind::TestRunFailed { reason: e.to_string() }, message: e.to_string() },
            }
        }

        Request::GetContracts { contract_type, id_substring } => match contracts::list_contracts(paths) {
            Ok(all) => {
                let filtered = all
                    .into_iter()
                    .filter(|c| contract_type.is_none_or(|t| c.contract_type == t))
                    .filter(|c| id_substring.as_ref().is_none_or(|s| c.id.as_str().contains(s.as_str())))
                    .collect();
                Response::Contracts { contracts: filtered }
            }
            Err(e) => Response::Error { error: RequestErrorKind::TestRunFailed { reason: e.to_string() }, message: e.to_string() },
        },

        Request::RecordDecision { category, decision, rationale, originating_task } => {
            let record = ArchitecturalDecision {
                id: warden_core::DecisionId::new(),
                originating_task,
                session_id: caller_session_id.to_string(),
                category,
                decision,
                rationale,
                timestamp_ms: now_ms,
            };
            match decisions::record_decision(paths, &record) {
                Ok(()) => Response::DecisionRecorded { decision: Box::new(record) },
                Err(e) => Response::Error { error: RequestErrorKind::TestRunFailed { reason: e.to_string() }, message: e.to_string() },
            }
        }

        Request::GetDecisions { category } => match decisions::list_decisions(paths) {
            Ok(all) => {
                let filtered = all.into_iter().filter(|d| category.is_none_or(|c| d.category == c)).collect();
                Response::Decisions { decisions: filtered }
            }
            Err(e) => Response::Error { error: RequestErrorKind::TestRunFailed { reason: e.to_string() }, message: e.to_string() },
        },

        Request::RunTests { files, timeout_secs } => {
            crate::test_runner::run_tests(paths, test_command, &files, timeout_secs).await
        }
    }
}

/// Reload the current `RunState`, used by callers (mainly tests) that need
/// to confirm a dispatched mutation landed. `None` until the Cycle Engine
/// has written its first checkpoint.
pub fn current_run_state(paths: &ProjectPaths) -> Result<Option<warden_core::RunState>, StoreError> {
    run_state::load_run_state(paths)
}

#[cfg(test)]
#[path = "coordination_tests.rs"]
mod tests;
