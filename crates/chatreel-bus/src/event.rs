// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The closed set of conversation lifecycle events.
//!
//! Every event carries an envelope (id, timestamp, conversation id) and a
//! typed [`EventKind`]. Serialized form:
//!
//! ```json
//! { "id": "...", "timestamp": "...", "conversation_id": "demo",
//!   "type": "message.sent", "payload": { "index": 0, ... } }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chatreel_core::{
    ConversationId, ConversationProgress, FlowId, FlowResult, FlowStepKind, MessageId, Sender,
    StepOutcome,
};

/// Every dotted event type name, grouped as conversation, message, flow and debug.
pub const EVENT_TYPES: [&str; 22] = [
    "conversation.started",
    "conversation.paused",
    "conversation.resumed",
    "conversation.completed",
    "conversation.reset",
    "conversation.jumped",
    "conversation.speed_changed",
    "conversation.restarted",
    "conversation.error",
    "message.queued",
    "message.typing_started",
    "message.typing_stopped",
    "message.sent",
    "message.delivered",
    "message.read",
    "flow.triggered",
    "flow.step_started",
    "flow.step_completed",
    "flow.completed",
    "flow.failed",
    "debug.log",
    "debug.state_snapshot",
];

/// A single lifecycle event. Built by the functions in [`crate::factory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub conversation_id: ConversationId,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl ConversationEvent {
    /// Wrap `kind` in a fresh envelope stamped now.
    pub fn new(conversation_id: ConversationId, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            conversation_id,
            kind,
        }
    }

    /// Dotted type name, e.g. `message.sent`.
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    /// The message index this event refers to, if any.
    pub fn message_index(&self) -> Option<usize> {
        self.kind.message_index()
    }

    /// Serialize as a single JSON line.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Severity attached to `debug.log` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Type-specific payload of a [`ConversationEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventKind {
    #[serde(rename = "conversation.started")]
    ConversationStarted {
        total_messages: usize,
        speed_multiplier: f64,
    },
    #[serde(rename = "conversation.paused")]
    ConversationPaused { index: usize },
    #[serde(rename = "conversation.resumed")]
    ConversationResumed { index: usize },
    #[serde(rename = "conversation.completed")]
    ConversationCompleted { final_index: usize, elapsed_ms: u64 },
    #[serde(rename = "conversation.reset")]
    ConversationReset { previous_index: usize },
    #[serde(rename = "conversation.jumped")]
    ConversationJumped { from_index: usize, to_index: usize },
    #[serde(rename = "conversation.speed_changed")]
    ConversationSpeedChanged { previous: f64, current: f64 },
    #[serde(rename = "conversation.restarted")]
    ConversationRestarted { iteration: u32 },
    #[serde(rename = "conversation.error")]
    ConversationError {
        message: String,
        recoverable: bool,
        index: Option<usize>,
    },

    #[serde(rename = "message.queued")]
    MessageQueued {
        index: usize,
        message_id: MessageId,
        sender: Sender,
        /// Milliseconds until `message.sent` is expected.
        estimated_send_ms: u64,
    },
    #[serde(rename = "message.typing_started")]
    MessageTypingStarted {
        index: usize,
        message_id: MessageId,
        sender: Sender,
    },
    #[serde(rename = "message.typing_stopped")]
    MessageTypingStopped { index: usize, message_id: MessageId },
    #[serde(rename = "message.sent")]
    MessageSent {
        index: usize,
        message_id: MessageId,
        sender: Sender,
        preview: String,
    },
    #[serde(rename = "message.delivered")]
    MessageDelivered { index: usize, message_id: MessageId },
    #[serde(rename = "message.read")]
    MessageRead { index: usize, message_id: MessageId },

    #[serde(rename = "flow.triggered")]
    FlowTriggered {
        flow_id: FlowId,
        name: String,
        message_index: usize,
        step_count: usize,
    },
    #[serde(rename = "flow.step_started")]
    FlowStepStarted {
        flow_id: FlowId,
        step_index: usize,
        step_id: String,
        kind: FlowStepKind,
    },
    #[serde(rename = "flow.step_completed")]
    FlowStepCompleted {
        flow_id: FlowId,
        step_index: usize,
        step_id: String,
        outcome: StepOutcome,
    },
    #[serde(rename = "flow.completed")]
    FlowCompleted { flow_id: FlowId, result: FlowResult },
    #[serde(rename = "flow.failed")]
    FlowFailed {
        flow_id: FlowId,
        step_index: Option<usize>,
        reason: String,
    },

    #[serde(rename = "debug.log")]
    DebugLog { level: DebugLevel, message: String },
    #[serde(rename = "debug.state_snapshot")]
    DebugStateSnapshot {
        progress: ConversationProgress,
        pending: Option<String>,
    },
}

impl EventKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::ConversationStarted { .. } => "conversation.started",
            EventKind::ConversationPaused { .. } => "conversation.paused",
            EventKind::ConversationResumed { .. } => "conversation.resumed",
            EventKind::ConversationCompleted { .. } => "conversation.completed",
            EventKind::ConversationReset { .. } => "conversation.reset",
            EventKind::ConversationJumped { .. } => "conversation.jumped",
            EventKind::ConversationSpeedChanged { .. } => "conversation.speed_changed",
            EventKind::ConversationRestarted { .. } => "conversation.restarted",
            EventKind::ConversationError { .. } => "conversation.error",
            EventKind::MessageQueued { .. } => "message.queued",
            EventKind::MessageTypingStarted { .. } => "message.typing_started",
            EventKind::MessageTypingStopped { .. } => "message.typing_stopped",
            EventKind::MessageSent { .. } => "message.sent",
            EventKind::MessageDelivered { .. } => "message.delivered",
            EventKind::MessageRead { .. } => "message.read",
            EventKind::FlowTriggered { .. } => "flow.triggered",
            EventKind::FlowStepStarted { .. } => "flow.step_started",
            EventKind::FlowStepCompleted { .. } => "flow.step_completed",
            EventKind::FlowCompleted { .. } => "flow.completed",
            EventKind::FlowFailed { .. } => "flow.failed",
            EventKind::DebugLog { .. } => "debug.log",
            EventKind::DebugStateSnapshot { .. } => "debug.state_snapshot",
        }
    }

    pub fn message_index(&self) -> Option<usize> {
        match self {
            EventKind::MessageQueued { index, .. }
            | EventKind::MessageTypingStarted { index, .. }
            | EventKind::MessageTypingStopped { index, .. }
            | EventKind::MessageSent { index, .. }
            | EventKind::MessageDelivered { index, .. }
            | EventKind::MessageRead { index, .. } => Some(*index),
            EventKind::FlowTriggered { message_index, .. } => Some(*message_index),
            EventKind::ConversationError { index, .. } => *index,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_are_unique() {
        let mut types = EVENT_TYPES.to_vec();
        types.sort_unstable();
        types.dedup();
        assert_eq!(types.len(), 22);
    }

    #[test]
    fn serializes_with_type_and_payload() {
        let event = ConversationEvent::new(
            "demo".into(),
            EventKind::ConversationJumped {
                from_index: 1,
                to_index: 4,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "conversation.jumped");
        assert_eq!(json["payload"]["from_index"], 1);
        assert_eq!(json["payload"]["to_index"], 4);
        assert_eq!(json["conversation_id"], "demo");
        assert!(json["id"].is_string());
    }

    #[test]
    fn json_line_parses_back() {
        let event = ConversationEvent::new(
            "demo".into(),
            EventKind::MessageRead {
                index: 2,
                message_id: "m2".into(),
            },
        );
        let line = event.to_json_line().unwrap();
        assert!(!line.contains('\n'));
        let parsed: ConversationEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn message_index_covers_message_events() {
        let sent = EventKind::MessageSent {
            index: 3,
            message_id: "m3".into(),
            sender: Sender::Business,
            preview: "hi".into(),
        };
        assert_eq!(sent.message_index(), Some(3));
        assert_eq!(
            EventKind::ConversationPaused { index: 3 }.message_index(),
            None
        );
    }
}
