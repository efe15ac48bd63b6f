// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn issue(desc: &str, file: Option<&str>) -> KnownIssue {
    KnownIssue {
        id: KnownIssueId::new(),
        description: desc.to_string(),
        severity: Severity::Medium,
        source: IssueSource::FlowTracing,
        file_path: file.map(str::to_string),
        cycle_found: 1,
        cycle_addressed: None,
        addressed: false,
    }
}

fn descriptions() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{1,120}"
}

fn files() -> impl Strategy<Value = Option<String>> {
    prop_oneof![Just(None), "[a-z/]{1,20}\\.rs".prop_map(Some)]
}

proptest! {
    #[test]
    fn registry_never_holds_two_issues_with_equal_dedup_key(
        batches in proptest::collection::vec((descriptions(), files()), 1..20),
    ) {
        let mut registry = Vec::new();
        for (desc, file) in &batches {
            add_known_issues(&mut registry, vec![issue(desc, file.as_deref())]);
        }
        let mut keys: Vec<String> = registry.iter().map(|i| i.dedup_key()).collect();
        keys.sort();
        let before = keys.len();
        keys.dedup();
        prop_assert_eq!(keys.len(), before);
    }

    #[test]
    fn readding_same_key_twice_does_not_grow_registry(
        desc in descriptions(),
        file in files(),
    ) {
        let mut registry = Vec::new();
        add_known_issues(&mut registry, vec![issue(&desc, file.as_deref())]);
        add_known_issues(&mut registry, vec![issue(&desc.to_uppercase(), file.as_deref())]);
        prop_assert_eq!(registry.len(), 1);
    }
}
