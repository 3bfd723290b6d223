// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle events and the per-engine event bus.
//!
//! The event set is closed: 9 conversation, 6 message, 5 flow and 2 debug
//! variants, all constructed through [`factory`]. Consumers either pull from
//! an [`EventStream`] or register a handler with [`EventBus::subscribe`].

pub mod bus;
pub mod event;
pub mod factory;
pub mod filter;

pub use bus::{EventBus, EventStream, Subscription};
pub use event::{ConversationEvent, DebugLevel, EVENT_TYPES, EventKind};
pub use filter::{EventFilter, matches_pattern};

/// Default ring capacity used when no configuration is supplied.
pub const DEFAULT_CAPACITY: usize = 1024;
