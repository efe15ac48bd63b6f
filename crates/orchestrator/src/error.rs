// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Store(#[from] warden_store::StoreError),

    #[error(transparent)]
    Core(#[from] warden_core::CoreError),

    #[error(transparent)]
    Adapter(#[from] warden_adapters::AdapterError),

    #[error(transparent)]
    Protocol(#[from] warden_wire::ProtocolError),

    #[error("planner produced no task block")]
    PlannerProducedNoTasks,

    #[error("escalation raised: {reason}")]
    Escalated { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
