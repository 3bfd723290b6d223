// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure constructors for every [`ConversationEvent`] variant.
//!
//! Each function stamps a fresh id and timestamp; none of them touch shared
//! state, so they are safe to call from tests and from any engine.

use std::time::Duration;

use chatreel_core::{
    ConversationId, ConversationProgress, Flow, FlowId, FlowResult, FlowStep, Message, StepOutcome,
};

use crate::event::{ConversationEvent, DebugLevel, EventKind};

fn event(conversation_id: &ConversationId, kind: EventKind) -> ConversationEvent {
    ConversationEvent::new(conversation_id.clone(), kind)
}

pub fn conversation_started(
    conversation_id: &ConversationId,
    total_messages: usize,
    speed_multiplier: f64,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::ConversationStarted {
            total_messages,
            speed_multiplier,
        },
    )
}

pub fn conversation_paused(conversation_id: &ConversationId, index: usize) -> ConversationEvent {
    event(conversation_id, EventKind::ConversationPaused { index })
}

pub fn conversation_resumed(conversation_id: &ConversationId, index: usize) -> ConversationEvent {
    event(conversation_id, EventKind::ConversationResumed { index })
}

pub fn conversation_completed(
    conversation_id: &ConversationId,
    final_index: usize,
    elapsed: Duration,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::ConversationCompleted {
            final_index,
            elapsed_ms: elapsed.as_millis() as u64,
        },
    )
}

pub fn conversation_reset(
    conversation_id: &ConversationId,
    previous_index: usize,
) -> ConversationEvent {
    event(conversation_id, EventKind::ConversationReset { previous_index })
}

pub fn conversation_jumped(
    conversation_id: &ConversationId,
    from_index: usize,
    to_index: usize,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::ConversationJumped {
            from_index,
            to_index,
        },
    )
}

pub fn conversation_speed_changed(
    conversation_id: &ConversationId,
    previous: f64,
    current: f64,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::ConversationSpeedChanged { previous, current },
    )
}

pub fn conversation_restarted(conversation_id: &ConversationId, iteration: u32) -> ConversationEvent {
    event(conversation_id, EventKind::ConversationRestarted { iteration })
}

pub fn conversation_error(
    conversation_id: &ConversationId,
    message: impl Into<String>,
    recoverable: bool,
    index: Option<usize>,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::ConversationError {
            message: message.into(),
            recoverable,
            index,
        },
    )
}

pub fn message_queued(
    conversation_id: &ConversationId,
    index: usize,
    message: &Message,
    estimated_send: Duration,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::MessageQueued {
            index,
            message_id: message.id.clone(),
            sender: message.sender,
            estimated_send_ms: estimated_send.as_millis() as u64,
        },
    )
}

pub fn message_typing_started(
    conversation_id: &ConversationId,
    index: usize,
    message: &Message,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::MessageTypingStarted {
            index,
            message_id: message.id.clone(),
            sender: message.sender,
        },
    )
}

pub fn message_typing_stopped(
    conversation_id: &ConversationId,
    index: usize,
    message: &Message,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::MessageTypingStopped {
            index,
            message_id: message.id.clone(),
        },
    )
}

pub fn message_sent(
    conversation_id: &ConversationId,
    index: usize,
    message: &Message,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::MessageSent {
            index,
            message_id: message.id.clone(),
            sender: message.sender,
            preview: message.content.preview(),
        },
    )
}

pub fn message_delivered(
    conversation_id: &ConversationId,
    index: usize,
    message: &Message,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::MessageDelivered {
            index,
            message_id: message.id.clone(),
        },
    )
}

pub fn message_read(
    conversation_id: &ConversationId,
    index: usize,
    message: &Message,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::MessageRead {
            index,
            message_id: message.id.clone(),
        },
    )
}

pub fn flow_triggered(
    conversation_id: &ConversationId,
    flow: &Flow,
    message_index: usize,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::FlowTriggered {
            flow_id: flow.id.clone(),
            name: flow.name.clone(),
            message_index,
            step_count: flow.steps.len(),
        },
    )
}

pub fn flow_step_started(
    conversation_id: &ConversationId,
    flow_id: &FlowId,
    step_index: usize,
    step: &FlowStep,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::FlowStepStarted {
            flow_id: flow_id.clone(),
            step_index,
            step_id: step.id.clone(),
            kind: step.content.kind(),
        },
    )
}

pub fn flow_step_completed(
    conversation_id: &ConversationId,
    flow_id: &FlowId,
    step_index: usize,
    step: &FlowStep,
    outcome: StepOutcome,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::FlowStepCompleted {
            flow_id: flow_id.clone(),
            step_index,
            step_id: step.id.clone(),
            outcome,
        },
    )
}

pub fn flow_completed(conversation_id: &ConversationId, result: FlowResult) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::FlowCompleted {
            flow_id: result.flow_id.clone(),
            result,
        },
    )
}

pub fn flow_failed(
    conversation_id: &ConversationId,
    flow_id: &FlowId,
    step_index: Option<usize>,
    reason: impl Into<String>,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::FlowFailed {
            flow_id: flow_id.clone(),
            step_index,
            reason: reason.into(),
        },
    )
}

pub fn debug_log(
    conversation_id: &ConversationId,
    level: DebugLevel,
    message: impl Into<String>,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::DebugLog {
            level,
            message: message.into(),
        },
    )
}

pub fn debug_state_snapshot(
    conversation_id: &ConversationId,
    progress: ConversationProgress,
    pending: Option<String>,
) -> ConversationEvent {
    event(
        conversation_id,
        EventKind::DebugStateSnapshot { progress, pending },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatreel_core::{FlowStepContent, Reward};

    fn conv() -> ConversationId {
        "demo".into()
    }

    #[test]
    fn factories_stamp_distinct_ids() {
        let a = conversation_paused(&conv(), 1);
        let b = conversation_paused(&conv(), 1);
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
    }

    #[test]
    fn message_factories_copy_identity() {
        let msg = Message::business("m7", "Your points: 120");
        let sent = message_sent(&conv(), 7, &msg);
        assert_eq!(sent.event_type(), "message.sent");
        match sent.kind {
            EventKind::MessageSent {
                index,
                message_id,
                preview,
                ..
            } => {
                assert_eq!(index, 7);
                assert_eq!(message_id.0, "m7");
                assert_eq!(preview, "Your points: 120");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn completed_reports_elapsed_millis() {
        let e = conversation_completed(&conv(), 4, Duration::from_millis(2500));
        assert_eq!(
            e.kind,
            EventKind::ConversationCompleted {
                final_index: 4,
                elapsed_ms: 2500
            }
        );
    }

    #[test]
    fn flow_factories_describe_steps() {
        let step = FlowStep::new(
            "pick",
            300,
            FlowStepContent::RewardGallery {
                rewards: vec![Reward {
                    id: "r1".into(),
                    title: "Muffin".into(),
                    cost_points: 30,
                }],
                selected: Some(0),
            },
        );
        let flow = Flow::new("loyalty", "Loyalty", 1).step(step.clone());
        let triggered = flow_triggered(&conv(), &flow, 1);
        assert_eq!(triggered.message_index(), Some(1));
        let started = flow_step_started(&conv(), &flow.id, 0, &step);
        assert_eq!(started.event_type(), "flow.step_started");
        let result = FlowResult {
            flow_id: flow.id.clone(),
            outcomes: vec![],
        };
        let completed = flow_completed(&conv(), result);
        assert!(matches!(
            completed.kind,
            EventKind::FlowCompleted { ref flow_id, .. } if flow_id.0 == "loyalty"
        ));
    }
}
