// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builder for assembling conversation scripts in code.

use crate::types::{
    BusinessProfile, Conversation, ConversationId, ConversationSettings, Flow, Message,
};

/// Fluent builder for [`Conversation`].
///
/// ```
/// use chatreel_core::{ConversationBuilder, Message};
///
/// let conv = ConversationBuilder::new("demo")
///     .title("Coffee loyalty")
///     .business("Cafe Aroma", "+34 600 000 000")
///     .user("Hi, do you have a loyalty card?")
///     .business_says("We do! Scan this to join.")
///     .build();
/// assert_eq!(conv.len(), 2);
/// assert_eq!(conv.messages[1].id.0, "msg-1");
/// ```
#[derive(Debug, Clone)]
pub struct ConversationBuilder {
    id: String,
    title: String,
    business: BusinessProfile,
    messages: Vec<Message>,
    flows: Vec<Flow>,
    settings: ConversationSettings,
}

impl ConversationBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            business: BusinessProfile::default(),
            messages: Vec::new(),
            flows: Vec::new(),
            settings: ConversationSettings::default(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn business(mut self, name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        self.business = BusinessProfile {
            name: name.into(),
            phone_number: phone_number.into(),
            verified: self.business.verified,
        };
        self
    }

    pub fn verified(mut self) -> Self {
        self.business.verified = true;
        self
    }

    /// Append a user text message with a generated id (`msg-<index>`).
    pub fn user(self, text: impl Into<String>) -> Self {
        let id = self.next_id();
        self.message(Message::user(id, text))
    }

    /// Append a business text message with a generated id.
    pub fn business_says(self, text: impl Into<String>) -> Self {
        let id = self.next_id();
        self.message(Message::business(id, text))
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn flow(mut self, flow: Flow) -> Self {
        self.flows.push(flow);
        self
    }

    pub fn settings(mut self, settings: ConversationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn speed(mut self, multiplier: f64) -> Self {
        self.settings.speed_multiplier = multiplier;
        self
    }

    /// Fix the typing duration so playback timing is deterministic.
    pub fn fixed_typing(mut self, millis: u64) -> Self {
        self.settings.typing_min_ms = Some(millis);
        self.settings.typing_max_ms = Some(millis);
        self
    }

    pub fn auto_restart(mut self, delay_ms: u64) -> Self {
        self.settings.auto_restart = true;
        self.settings.restart_delay_ms = Some(delay_ms);
        self
    }

    pub fn build(self) -> Conversation {
        Conversation {
            id: ConversationId(self.id),
            title: self.title,
            business: self.business,
            messages: self.messages,
            flows: self.flows,
            settings: self.settings,
        }
    }

    fn next_id(&self) -> String {
        format!("msg-{}", self.messages.len())
    }
}
