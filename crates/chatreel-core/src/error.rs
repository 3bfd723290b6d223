// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chatreel simulator.

use thiserror::Error;

/// The primary error type shared by the Chatreel crates.
///
/// Component crates keep their own narrower error enums (`EngineError`,
/// `ExportError`) and convert into this one at crate boundaries.
#[derive(Debug, Error)]
pub enum ChatreelError {
    /// Configuration errors (invalid TOML, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A conversation script is malformed (bad flow reference, empty message).
    #[error("script error: {message}")]
    Script { message: String },

    /// A playback step failed.
    #[error("playback error: {message}")]
    Playback { message: String, recoverable: bool },

    /// A flow step could not be processed.
    #[error("flow `{flow_id}` failed: {message}")]
    Flow { flow_id: String, message: String },

    /// The render surface could not be sampled.
    #[error("capture error: {message}")]
    Capture {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// GIF encoding failed.
    #[error("encode error: {message}")]
    Encode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Filesystem errors (reading scripts, writing exports).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatreelError {
    /// Whether playback may continue after this error.
    ///
    /// Script errors are never recoverable; flow errors always are, because a
    /// failed flow hands control back to the main timeline.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ChatreelError::Script { .. } => false,
            ChatreelError::Playback { recoverable, .. } => *recoverable,
            ChatreelError::Flow { .. } => true,
            ChatreelError::Capture { .. }
            | ChatreelError::Encode { .. }
            | ChatreelError::Io(_) => true,
            ChatreelError::Config(_) | ChatreelError::Internal(_) => false,
        }
    }
}
