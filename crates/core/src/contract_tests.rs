// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn contract_id_equality_is_by_string_value() {
    assert_eq!(ContractId::new("POST /api/users"), ContractId::from("POST /api/users"));
}

#[test]
fn contract_round_trips_through_json() {
    let contract = Contract {
        id: ContractId::new("POST /api/users"),
        contract_type: ContractType::ApiEndpoint,
        specification: "creates a user".to_string(),
        owning_task: "task-001".to_string(),
        registered_at_ms: 10,
    };
    let json = serde_json::to_string(&contract).expect("serialize");
    let back: Contract = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.id, contract.id);
    assert_eq!(back.contract_type, contract.contract_type);
}
