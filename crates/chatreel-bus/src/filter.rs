// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composable event predicates.
//!
//! Patterns use NATS-style wildcards over dotted type names:
//! - `*` matches exactly one token: `message.*` matches `message.sent`
//! - `>` matches one or more trailing tokens: `flow.>` matches every flow event
//!
//! ```
//! use chatreel_bus::EventFilter;
//!
//! let receipts = EventFilter::pattern("message.delivered")
//!     .or(EventFilter::pattern("message.read"));
//! let not_debug = EventFilter::type_prefix("debug").not();
//! let _both = receipts.and(not_debug);
//! ```

use chrono::{DateTime, Utc};

use chatreel_core::ConversationId;

use crate::event::ConversationEvent;

/// Whether a dotted `subject` matches a NATS-style `pattern`.
pub fn matches_pattern(pattern: &str, subject: &str) -> bool {
    let mut wanted = pattern.split('.').peekable();
    let mut tokens = subject.split('.');
    while let Some(want) = wanted.next() {
        let Some(token) = tokens.next() else {
            return false;
        };
        match want {
            ">" => return wanted.peek().is_none(),
            "*" => {}
            literal if literal != token => return false,
            _ => {}
        }
    }
    tokens.next().is_none()
}

/// A predicate over [`ConversationEvent`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EventFilter {
    #[default]
    All,
    /// Event type equals the prefix or continues it with a `.`.
    TypePrefix(String),
    Pattern(String),
    Conversation(ConversationId),
    /// Inclusive bounds; `None` leaves that side open.
    TimeRange {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    And(Box<EventFilter>, Box<EventFilter>),
    Or(Box<EventFilter>, Box<EventFilter>),
    Not(Box<EventFilter>),
}

impl EventFilter {
    pub fn all() -> Self {
        EventFilter::All
    }

    pub fn type_prefix(prefix: impl Into<String>) -> Self {
        EventFilter::TypePrefix(prefix.into())
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        EventFilter::Pattern(pattern.into())
    }

    pub fn conversation(id: impl Into<ConversationId>) -> Self {
        EventFilter::Conversation(id.into())
    }

    pub fn time_range(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        EventFilter::TimeRange { from, to }
    }

    pub fn and(self, other: EventFilter) -> Self {
        EventFilter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: EventFilter) -> Self {
        EventFilter::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        EventFilter::Not(Box::new(self))
    }

    pub fn matches(&self, event: &ConversationEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::TypePrefix(prefix) => {
                let ty = event.event_type();
                if prefix.ends_with('.') {
                    ty.starts_with(prefix.as_str())
                } else {
                    ty == prefix
                        || ty
                            .strip_prefix(prefix.as_str())
                            .is_some_and(|rest| rest.starts_with('.'))
                }
            }
            EventFilter::Pattern(pattern) => matches_pattern(pattern, event.event_type()),
            EventFilter::Conversation(id) => event.conversation_id == *id,
            EventFilter::TimeRange { from, to } => {
                from.is_none_or(|from| event.timestamp >= from)
                    && to.is_none_or(|to| event.timestamp <= to)
            }
            EventFilter::And(a, b) => a.matches(event) && b.matches(event),
            EventFilter::Or(a, b) => a.matches(event) || b.matches(event),
            EventFilter::Not(inner) => !inner.matches(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use chatreel_core::Message;
    use chrono::Duration;

    fn sent(conv: &str) -> ConversationEvent {
        factory::message_sent(&conv.into(), 0, &Message::user("m0", "hi"))
    }

    #[test]
    fn pattern_exact() {
        assert!(matches_pattern("message.sent", "message.sent"));
        assert!(!matches_pattern("message.sent", "message.read"));
        assert!(!matches_pattern("message", "message.sent"));
    }

    #[test]
    fn pattern_single_wildcard() {
        assert!(matches_pattern("message.*", "message.sent"));
        assert!(matches_pattern("*.completed", "flow.completed"));
        assert!(!matches_pattern("message.*", "message"));
        assert!(!matches_pattern("*", "message.sent"));
    }

    #[test]
    fn pattern_tail_wildcard() {
        assert!(matches_pattern("flow.>", "flow.step_started"));
        assert!(matches_pattern(">", "debug.log"));
        assert!(!matches_pattern("flow.>", "flow"));
        assert!(!matches_pattern("flow.>", "message.sent"));
        assert!(!matches_pattern(">.sent", "message.sent"));
    }

    #[test]
    fn type_prefix_respects_token_boundary() {
        let event = sent("demo");
        assert!(EventFilter::type_prefix("message").matches(&event));
        assert!(EventFilter::type_prefix("message.").matches(&event));
        assert!(EventFilter::type_prefix("message.sent").matches(&event));
        assert!(!EventFilter::type_prefix("mess").matches(&event));
        assert!(!EventFilter::type_prefix("flow").matches(&event));
    }

    #[test]
    fn conversation_filter() {
        let event = sent("a");
        assert!(EventFilter::conversation("a").matches(&event));
        assert!(!EventFilter::conversation("b").matches(&event));
    }

    #[test]
    fn time_range_is_inclusive_and_open_ended() {
        let event = sent("demo");
        let t = event.timestamp;
        assert!(EventFilter::time_range(Some(t), Some(t)).matches(&event));
        assert!(EventFilter::time_range(None, Some(t)).matches(&event));
        assert!(!EventFilter::time_range(Some(t + Duration::seconds(1)), None).matches(&event));
        assert!(!EventFilter::time_range(None, Some(t - Duration::seconds(1))).matches(&event));
    }

    #[test]
    fn combinators_compose() {
        let event = sent("demo");
        let f = EventFilter::type_prefix("message")
            .and(EventFilter::conversation("demo"))
            .and(EventFilter::pattern("message.typing_started").not());
        assert!(f.matches(&event));
        let g = EventFilter::pattern("flow.>").or(EventFilter::pattern("debug.*"));
        assert!(!g.matches(&event));
        assert!(EventFilter::all().matches(&event));
        assert!(!EventFilter::all().not().matches(&event));
    }
}
