// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playback engine for Chatreel conversation scripts.
//!
//! [`TimelineEngine`] walks a conversation on Tokio timers and reports every
//! transition on its own [`chatreel_bus::EventBus`]. Interactive flows
//! embedded in the script are resolved by the [`flow`] sub-executor while
//! the main timeline waits.
//!
//! ```no_run
//! # async fn demo() -> Result<(), chatreel_engine::EngineError> {
//! use chatreel_bus::EventFilter;
//! use chatreel_config::ChatreelConfig;
//! use chatreel_core::ConversationBuilder;
//! use chatreel_engine::TimelineEngine;
//!
//! let conversation = ConversationBuilder::new("demo")
//!     .user("Hi!")
//!     .business_says("Hello, how can we help?")
//!     .build();
//! let engine = TimelineEngine::new(conversation, &ChatreelConfig::default())?;
//! let mut events = engine.events(EventFilter::pattern("message.sent"));
//! engine.start()?;
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.event_type());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod flow;
pub mod timeline;
pub mod timer;
pub mod timing;

pub use error::EngineError;
pub use flow::{FlowFailure, FlowRun, resolve_step};
pub use timeline::TimelineEngine;
pub use timing::{MAX_SPEED, MIN_SPEED, Timings};
