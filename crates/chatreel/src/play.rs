// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatreel play`: run a script on the timeline engine and print its events.

use std::io::IsTerminal;
use std::sync::Arc;

use chatreel_bus::{ConversationEvent, EventFilter, EventKind};
use chatreel_config::ChatreelConfig;
use chatreel_core::{ChatreelError, Conversation, Message, TriggerHook, TriggerKind};
use chatreel_engine::TimelineEngine;
use colored::Colorize;
use tracing::{debug, info};

/// Logs AI and gamification triggers. The CLI has no backend to call.
#[derive(Debug, Default)]
pub struct LoggingHook;

impl TriggerHook for LoggingHook {
    fn on_trigger(
        &self,
        kind: TriggerKind,
        index: usize,
        message: &Message,
    ) -> Result<(), ChatreelError> {
        info!(%kind, index, message_id = %message.id, "trigger fired");
        Ok(())
    }
}

/// Play `conversation` until it completes, fails, or the user interrupts.
///
/// Returns the exit code: 0 on completion, 1 on a non-recoverable error,
/// 130 on Ctrl+C.
pub async fn run_play(
    config: &ChatreelConfig,
    conversation: Conversation,
    speed: Option<f64>,
    json: bool,
    repeat: bool,
) -> Result<i32, ChatreelError> {
    let auto_restart = conversation.settings.auto_restart;
    let engine = TimelineEngine::new(conversation, config)?.with_trigger_hook(Arc::new(LoggingHook));
    if let Some(speed) = speed {
        engine.set_speed(speed)?;
    }

    let use_color = !json && std::io::stdout().is_terminal();
    let mut stream = engine.events(EventFilter::all());
    engine.start()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("received Ctrl+C, stopping playback");
                engine.reset();
                return Ok(130);
            }
            event = stream.recv() => {
                let Some(event) = event else {
                    debug!("event stream closed");
                    return Ok(0);
                };
                print_event(&event, json, use_color)?;

                match &event.kind {
                    EventKind::ConversationError { recoverable: true, .. } => {
                        engine.resume()?;
                    }
                    EventKind::ConversationError { recoverable: false, .. } => return Ok(1),
                    EventKind::ConversationCompleted { .. } if !repeat => return Ok(0),
                    // Without auto-restart the script has to be started again by hand.
                    EventKind::ConversationCompleted { .. } if !auto_restart => engine.start()?,
                    _ => {}
                }
            }
        }
    }
}

fn print_event(event: &ConversationEvent, json: bool, use_color: bool) -> Result<(), ChatreelError> {
    if json {
        let line = event
            .to_json_line()
            .map_err(|e| ChatreelError::Internal(format!("failed to serialize event: {e}")))?;
        println!("{line}");
        return Ok(());
    }

    let event_type = event.event_type();
    let detail = describe(&event.kind);
    let stamp = event.timestamp.format("%H:%M:%S%.3f");
    if use_color {
        let event_type = match &event.kind {
            EventKind::ConversationError { .. } | EventKind::FlowFailed { .. } => {
                event_type.red().to_string()
            }
            EventKind::ConversationCompleted { .. } | EventKind::FlowCompleted { .. } => {
                event_type.green().to_string()
            }
            _ if event_type.starts_with("flow.") => event_type.cyan().to_string(),
            _ => event_type.to_string(),
        };
        println!("  {} {event_type:<30} {detail}", stamp.to_string().dimmed());
    } else {
        println!("  {stamp} {event_type:<24} {detail}");
    }
    Ok(())
}

/// One-line human summary of an event payload.
fn describe(kind: &EventKind) -> String {
    match kind {
        EventKind::ConversationStarted {
            total_messages,
            speed_multiplier,
        } => format!("{total_messages} messages at {speed_multiplier}x"),
        EventKind::ConversationPaused { index } | EventKind::ConversationResumed { index } => {
            format!("at message {index}")
        }
        EventKind::ConversationCompleted {
            final_index,
            elapsed_ms,
        } => format!("last message {final_index} after {elapsed_ms}ms"),
        EventKind::ConversationReset { previous_index } => {
            format!("was at message {previous_index}")
        }
        EventKind::ConversationJumped {
            from_index,
            to_index,
        } => format!("{from_index} -> {to_index}"),
        EventKind::ConversationSpeedChanged { previous, current } => {
            format!("{previous}x -> {current}x")
        }
        EventKind::ConversationRestarted { iteration } => format!("iteration {iteration}"),
        EventKind::ConversationError {
            message,
            recoverable,
            ..
        } => {
            let tag = if *recoverable { "recoverable" } else { "fatal" };
            format!("[{tag}] {message}")
        }
        EventKind::MessageQueued {
            index,
            sender,
            estimated_send_ms,
            ..
        } => format!("#{index} {sender}, sends in ~{estimated_send_ms}ms"),
        EventKind::MessageTypingStarted { index, sender, .. } => {
            format!("#{index} {sender} is typing")
        }
        EventKind::MessageTypingStopped { index, .. }
        | EventKind::MessageDelivered { index, .. }
        | EventKind::MessageRead { index, .. } => format!("#{index}"),
        EventKind::MessageSent {
            index,
            sender,
            preview,
            ..
        } => format!("#{index} {sender}: {preview}"),
        EventKind::FlowTriggered {
            flow_id,
            name,
            step_count,
            ..
        } => format!("{flow_id} \"{name}\" ({step_count} steps)"),
        EventKind::FlowStepStarted {
            flow_id,
            step_index,
            kind,
            ..
        } => format!("{flow_id} step {step_index} ({kind})"),
        EventKind::FlowStepCompleted {
            flow_id,
            step_index,
            step_id,
            ..
        } => format!("{flow_id} step {step_index} `{step_id}` done"),
        EventKind::FlowCompleted { flow_id, result } => {
            let reward = result
                .selected_reward()
                .map(|r| format!(", reward {}", r.title))
                .unwrap_or_default();
            format!("{flow_id}: {} points{reward}", result.points())
        }
        EventKind::FlowFailed {
            flow_id, reason, ..
        } => format!("{flow_id}: {reason}"),
        EventKind::DebugLog { level, message } => format!("[{level:?}] {message}"),
        EventKind::DebugStateSnapshot { progress, pending } => format!(
            "{} at {}{}",
            progress.status,
            progress.current_index,
            pending
                .as_deref()
                .map(|p| format!(", next {p}"))
                .unwrap_or_default()
        ),
    }
}
