// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

/// Build a task set over `n` nodes where node `i` depends on (and is
/// blocked-by-symmetrically) every `j < i` selected by `edges[i]`. This
/// construction can only ever produce a DAG: edges always point from a
/// higher index to a strictly lower one, so no cycle is representable.
fn acyclic_task_set(n: usize, edges: &[Vec<bool>]) -> Vec<Task> {
    let mut tasks: Vec<Task> = (0..n)
        .map(|i| Task::test_fixture(i as u32 + 1))
        .collect();
    for i in 0..n {
        for j in 0..i {
            if edges[i][j] {
                let dep = tasks[j].id;
                tasks[i].depends_on.insert(dep);
                let dependent = tasks[i].id;
                tasks[j].blocks.insert(dependent);
            }
        }
    }
    tasks
}

proptest! {
    #[test]
    fn acyclic_task_sets_always_validate(n in 1usize..8) {
        let edges: Vec<Vec<bool>> = (0..n).map(|i| vec![false; i]).collect();
        let tasks = acyclic_task_set(n, &edges);
        prop_assert!(validate_dag(&tasks).is_ok());
    }

    #[test]
    fn random_lower_triangular_edges_always_validate(
        n in 1usize..8,
        flags in proptest::collection::vec(any::<bool>(), 0..28),
    ) {
        let mut edges = vec![Vec::new(); n];
        let mut idx = 0;
        for i in 0..n {
            edges[i] = (0..i).map(|_| {
                let f = flags.get(idx).copied().unwrap_or(false);
                idx += 1;
                f
            }).collect();
        }
        let tasks = acyclic_task_set(n, &edges);
        prop_assert!(validate_dag(&tasks).is_ok());
    }

    #[test]
    fn broken_symmetry_is_rejected(n in 2usize..8) {
        let edges: Vec<Vec<bool>> = (0..n).map(|i| if i == n - 1 { vec![true; i] } else { vec![false; i] }).collect();
        let mut tasks = acyclic_task_set(n, &edges);
        // Drop the reverse edge on one dependency, breaking blocks/depends_on symmetry.
        let dep = tasks[0].id;
        let last = tasks.len() - 1;
        tasks[0].blocks.remove(&tasks[last].id);
        let _ = dep;
        prop_assert!(matches!(validate_dag(&tasks), Err(CoreError::DependencyCycle(_))));
    }
}

#[test]
fn direct_two_cycle_is_rejected() {
    let mut a = Task::test_fixture(1);
    let mut b = Task::test_fixture(2);
    a.depends_on.insert(b.id);
    b.blocks.insert(a.id);
    b.depends_on.insert(a.id);
    a.blocks.insert(b.id);
    let err = validate_dag(&[a, b]).unwrap_err();
    assert!(matches!(err, CoreError::DependencyCycle(_)));
}
