// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

crate::define_sequential_id! {
    /// Test sequential ID type for macro verification.
    pub struct TestSeqId("item-");
}

#[test]
fn define_id_hash_map_lookup_by_str() {
    let id = TestId::from_string("tst-abc");
    let mut map = HashMap::new();
    map.insert(id.clone(), 42);
    assert_eq!(map.get("tst-abc"), Some(&42));
}

#[test]
fn define_id_new_has_prefix() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
}

#[test]
fn define_id_two_new_ids_differ() {
    assert_ne!(TestId::new(), TestId::new());
}

#[test]
fn short_fn_on_str() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}

#[test]
fn idbuf_roundtrips_through_serde_json() {
    let buf = IdBuf::new("hello-world");
    let json = serde_json::to_string(&buf).expect("serialize");
    let back: IdBuf = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(buf.as_str(), back.as_str());
}

#[test]
fn sequential_id_pads_to_three_digits() {
    assert_eq!(TestSeqId::sequential(1).as_str(), "item-001");
    assert_eq!(TestSeqId::sequential(42).as_str(), "item-042");
    assert_eq!(TestSeqId::sequential(123).as_str(), "item-123");
}

#[test]
fn sequential_id_sorts_by_creation_order() {
    let a = TestSeqId::sequential(1);
    let b = TestSeqId::sequential(2);
    let c = TestSeqId::sequential(10);
    let mut ids = vec![c.clone(), a.clone(), b.clone()];
    ids.sort();
    assert_eq!(ids, vec![a, b, c]);
}

#[test]
fn sequential_id_recovers_sequence_number() {
    let id = TestSeqId::sequential(7);
    assert_eq!(id.sequence_number(), Some(7));
    assert_eq!(TestSeqId::from_string("garbage").sequence_number(), None);
}
