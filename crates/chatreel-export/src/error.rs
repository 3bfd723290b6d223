// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors from the capture and export pipeline.
//!
//! Cancellation is not an error: a cancelled export resolves to
//! [`ExportOutcome::Cancelled`](crate::ExportOutcome::Cancelled).

use chatreel_core::ChatreelError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExportError {
    /// Capture options outside their allowed ranges.
    #[error("invalid capture options: {0}")]
    InvalidOptions(String),

    /// The render surface could not be sampled (usually detached).
    #[error("capture failed: {message}")]
    Capture { message: String },

    /// The GIF encoder rejected a frame or its output.
    #[error("encoding failed: {message}")]
    Encode { message: String },

    /// The background worker stopped without reporting a result.
    #[error("export worker failed: {0}")]
    Worker(String),
}

impl From<ExportError> for ChatreelError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::InvalidOptions(message) => ChatreelError::Config(message),
            ExportError::Capture { message } => ChatreelError::Capture {
                message,
                source: None,
            },
            ExportError::Encode { message } => ChatreelError::Encode {
                message,
                source: None,
            },
            ExportError::Worker(message) => ChatreelError::Internal(message),
        }
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Encode {
            message: err.to_string(),
        }
    }
}
