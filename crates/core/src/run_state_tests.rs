// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn fresh() -> RunState {
    RunState::new("add login", "warden/add-login", "abc123", 10, 3, 1_000)
}

#[test]
fn fresh_state_satisfies_invariants() {
    let state = fresh();
    assert!(state.invariants_hold());
    assert_eq!(state.status, RunStatus::Initializing);
}

#[test]
fn pause_sets_all_three_fields_together() {
    let mut state = fresh();
    state.pause(PauseReason::UsageLimit, 5_000, 2_000);
    assert_eq!(state.status, RunStatus::Paused);
    assert_eq!(state.paused_at_ms, Some(2_000));
    assert_eq!(state.resume_after_ms, Some(5_000));
    assert!(state.invariants_hold());
}

#[test]
fn resume_clears_all_three_fields_together() {
    let mut state = fresh();
    state.pause(PauseReason::UserRequested, 5_000, 2_000);
    state.resume(6_000);
    assert_eq!(state.status, RunStatus::Executing);
    assert_eq!(state.paused_at_ms, None);
    assert_eq!(state.resume_after_ms, None);
    assert!(state.invariants_hold());
}

#[test]
fn record_cycle_advances_current_cycle_and_history() {
    let mut state = fresh();
    state.record_cycle(CycleRecord {
        index: 1,
        plan_version: 1,
        tasks_completed: 3,
        tasks_failed: 0,
        plan_approved: true,
        code_approved: true,
        plan_rounds: 1,
        code_rounds: 1,
        started_at_ms: 1_000,
        ended_at_ms: 2_000,
        flow_summary: None,
    });
    assert_eq!(state.current_cycle, 1);
    assert_eq!(state.cycle_history.len(), 1);
    assert_eq!(state.cycle_history[0].duration_ms(), 1_000);
}

#[test]
fn current_cycle_never_exceeds_cap_is_checked_by_invariants() {
    let mut state = fresh();
    state.current_cycle = state.cycle_cap + 1;
    assert!(!state.invariants_hold());
}
