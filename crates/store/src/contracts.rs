// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared contract records under `contracts/<id>.json`. Last writer wins:
//! registering an existing id overwrites the file.

use warden_core::{Contract, ContractId};

use crate::atomic::{read_json, write_json_locked};
use crate::error::StoreError;
use crate::layout::ProjectPaths;

pub fn register_contract(paths: &ProjectPaths, contract: &Contract) -> Result<(), StoreError> {
    write_json_locked(&paths.contract_file(contract.id.as_str()), contract)
}

pub fn get_contract(paths: &ProjectPaths, id: &ContractId) -> Result<Contract, StoreError> {
    let path = paths.contract_file(id.as_str());
    read_json(&path).map_err(|e| match e {
        StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            StoreError::NotFound(id.to_string())
        }
        other => other,
    })
}

pub fn list_contracts(paths: &ProjectPaths) -> Result<Vec<Contract>, StoreError> {
    let dir = paths.contracts_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut contracts = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
        let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        contracts.push(read_json(&path)?);
    }
    contracts.sort_by(|a: &Contract, b: &Contract| a.id.as_str().cmp(b.id.as_str()));
    Ok(contracts)
}

#[cfg(test)]
#[path = "contracts_tests.rs"]
mod tests;
