// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors returned by engine control calls.
//!
//! These describe misuse of the API. Failures that happen while the
//! timeline runs are reported as `conversation.error` events instead.

use chatreel_core::{ChatreelError, PlaybackStatus};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The control call is not valid in the current playback state.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: PlaybackStatus,
        action: &'static str,
    },

    #[error("message index {index} is out of range (conversation has {len} messages)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("speed multiplier must be in (0, 10], got {0}")]
    InvalidSpeed(f64),

    #[error("invalid playback configuration: {0}")]
    InvalidConfig(String),
}

impl From<EngineError> for ChatreelError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidConfig(message) => ChatreelError::Config(message),
            other => ChatreelError::Playback {
                message: other.to_string(),
                recoverable: true,
            },
        }
    }
}
