// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chatreel conversation simulator.
//!
//! This crate provides the conversation script model, the shared error type,
//! structural script checks, and the adapter traits the engine and export
//! pipeline call into. It has no async runtime dependency.

pub mod builder;
pub mod error;
pub mod outcome;
pub mod script;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use builder::ConversationBuilder;
pub use error::ChatreelError;
pub use outcome::{FlowResult, StepOutcome};
pub use script::{IssueScope, ScriptIssue, Severity, check_script};
pub use traits::{RenderSurface, SurfaceFrame, TriggerHook, TriggerKind};
pub use types::{
    BusinessProfile, Conversation, ConversationId, ConversationProgress, ConversationSettings,
    Flow, FlowId, FlowStep, FlowStepContent, FlowStepKind, FormField, MediaDescriptor, MediaKind,
    Message, MessageContent, MessageId, MessageStatus, PlaybackStatus, Reward, Sender,
};
