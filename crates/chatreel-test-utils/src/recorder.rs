// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event recorder for asserting on bus traffic.

use std::time::Duration;

use chatreel_bus::{ConversationEvent, EventBus, EventFilter, EventStream};

/// How long [`EventRecorder::until`] waits (in Tokio time) before giving up.
pub const WAIT_LIMIT: Duration = Duration::from_secs(3600);

/// Collects every event from a stream, in order.
#[derive(Debug)]
pub struct EventRecorder {
    stream: EventStream,
    events: Vec<ConversationEvent>,
}

impl EventRecorder {
    pub fn new(stream: EventStream) -> Self {
        Self {
            stream,
            events: Vec::new(),
        }
    }

    /// Record everything published on `bus` from now on.
    pub fn attach(bus: &EventBus) -> Self {
        Self::new(bus.stream(EventFilter::all()))
    }

    /// Receive until an event of `event_type` arrives (inclusive) or the
    /// wait limit passes. Returns whether it arrived.
    pub async fn until(&mut self, event_type: &str) -> bool {
        let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
        loop {
            match tokio::time::timeout_at(deadline, self.stream.recv()).await {
                Ok(Some(event)) => {
                    let done = event.event_type() == event_type;
                    self.events.push(event);
                    if done {
                        return true;
                    }
                }
                Ok(None) | Err(_) => return false,
            }
        }
    }

    /// Pull whatever is already buffered without waiting.
    pub fn drain(&mut self) -> usize {
        let fresh = self.stream.drain();
        let n = fresh.len();
        self.events.extend(fresh);
        n
    }

    pub fn events(&self) -> &[ConversationEvent] {
        &self.events
    }

    pub fn types(&self) -> Vec<&'static str> {
        event_types(&self.events)
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    pub fn of_type(&self, event_type: &str) -> Vec<&ConversationEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Dotted type names of `events`, in order.
pub fn event_types(events: &[ConversationEvent]) -> Vec<&'static str> {
    events.iter().map(ConversationEvent::event_type).collect()
}
