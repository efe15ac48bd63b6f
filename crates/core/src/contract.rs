// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared interfaces registered by tasks for cross-worker consistency.

use serde::{Deserialize, Serialize};

/// A contract id is chosen by the registering worker (for example an API
/// path or a type name), not minted by the system, so it is a plain
/// free-form string rather than a generated id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContractId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    ApiEndpoint,
    TypeDefinition,
    EventSchema,
    DatabaseSchema,
}

crate::simple_display! {
    ContractType {
        ApiEndpoint => "api_endpoint",
        TypeDefinition => "type_definition",
        EventSchema => "event_schema",
        DatabaseSchema => "database_schema",
    }
}

/// A registered shared interface. Unique by id; registering an existing id
/// again overwrites it (last writer wins, per the coordination verb table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub contract_type: ContractType,
    pub specification: String,
    pub owning_task: String,
    pub registered_at_ms: u64,
}

#[cfg(test)]
#[path = "contract_tests.rs"]
mod tests;
