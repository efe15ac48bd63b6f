// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only inter-session messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Randomly minted message identifier.
    pub struct MessageId("msg-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Status,
    Question,
    Answer,
    Broadcast,
    WindDown,
    TaskCompleted,
    Error,
    Escalation,
}

crate::simple_display! {
    MessageType {
        Status => "status",
        Question => "question",
        Answer => "answer",
        Broadcast => "broadcast",
        WindDown => "wind_down",
        TaskCompleted => "task_completed",
        Error => "error",
        Escalation => "escalation",
    }
}

/// An event appended to a session's message log. Absent `to` means
/// broadcast: every session (and the engine) should consider itself
/// addressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub timestamp_ms: u64,
}

impl Message {
    pub fn new(
        from: impl Into<String>,
        message_type: MessageType,
        content: impl Into<String>,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            id: MessageId::new(),
            from: from.into(),
            to: None,
            message_type,
            content: content.into(),
            metadata: None,
            timestamp_ms,
        }
    }

    pub fn addressed_to(&self, recipient: &str) -> bool {
        match &self.to {
            None => true,
            Some(to) => to == recipient,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
