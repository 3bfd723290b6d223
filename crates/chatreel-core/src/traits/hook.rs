// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hook invoked for messages carrying AI or gamification triggers.

use strum::Display;

use crate::error::ChatreelError;
use crate::types::Message;

/// Which trigger flag fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TriggerKind {
    Ai,
    Gamification,
}

/// Host callback for `ai_trigger` / `gamification_trigger` messages.
///
/// Called right after the message is sent, while the engine holds its
/// state lock: implementations must not call back into the engine. An
/// `Err` is treated as a recoverable playback error.
pub trait TriggerHook: Send + Sync + 'static {
    fn on_trigger(
        &self,
        kind: TriggerKind,
        index: usize,
        message: &Message,
    ) -> Result<(), ChatreelError>;
}
