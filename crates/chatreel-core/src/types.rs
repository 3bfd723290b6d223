// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation script types and playback progress.
//!
//! Everything in this module except [`ConversationProgress`] is immutable
//! script data: the engine never mutates a [`Conversation`] once playback
//! has started.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ChatreelError;

/// Unique identifier for a conversation script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

/// Unique identifier for a message within a script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

/// Unique identifier for a flow definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub String);

macro_rules! id_display {
    ($($ty:ident),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $ty {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

id_display!(ConversationId, MessageId, FlowId);

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Sender {
    User,
    Business,
}

/// Delivery status of a message. Ordered: `Sent < Delivered < Read`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    /// Returns `next` if it moves the status forward, `None` otherwise.
    pub fn advance_to(self, next: MessageStatus) -> Option<MessageStatus> {
        (next > self).then_some(next)
    }
}

/// Kind of media attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
    Sticker,
}

/// Media attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub kind: MediaKind,
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Text and/or media body of a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Option<MediaDescriptor>,
}

impl MessageContent {
    /// Plain text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            media: None,
        }
    }

    /// Media-only content.
    pub fn media(media: MediaDescriptor) -> Self {
        Self {
            text: None,
            media: Some(media),
        }
    }

    /// True when there is neither non-blank text nor media.
    pub fn is_empty(&self) -> bool {
        let blank_text = self.text.as_deref().is_none_or(|t| t.trim().is_empty());
        blank_text && self.media.is_none()
    }

    /// Short text used for logs and rendered bubbles.
    pub fn preview(&self) -> String {
        match (&self.text, &self.media) {
            (Some(text), _) => text.clone(),
            (None, Some(media)) => format!("[{}]", media.kind),
            (None, None) => String::new(),
        }
    }
}

/// One conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub content: MessageContent,
    /// Script-relative offset in milliseconds (not wall clock).
    #[serde(default)]
    pub timestamp_ms: u64,
    /// Initial status as authored in the script.
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default)]
    pub ai_trigger: bool,
    #[serde(default)]
    pub flow_trigger: bool,
    #[serde(default)]
    pub gamification_trigger: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

impl Message {
    /// A text message with default flags.
    pub fn new(id: impl Into<String>, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: MessageId(id.into()),
            sender,
            content: MessageContent::text(text),
            timestamp_ms: 0,
            status: MessageStatus::Sent,
            ai_trigger: false,
            flow_trigger: false,
            gamification_trigger: false,
            is_final: false,
        }
    }

    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, Sender::User, text)
    }

    pub fn business(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, Sender::Business, text)
    }

    pub fn with_flow_trigger(mut self) -> Self {
        self.flow_trigger = true;
        self
    }

    pub fn with_ai_trigger(mut self) -> Self {
        self.ai_trigger = true;
        self
    }

    pub fn with_gamification_trigger(mut self) -> Self {
        self.gamification_trigger = true;
        self
    }

    pub fn final_message(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Business identity shown in the chat header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub verified: bool,
}

/// Per-script playback overrides. Unset values fall back to engine config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSettings {
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,
    #[serde(default)]
    pub auto_restart: bool,
    #[serde(default)]
    pub restart_delay_ms: Option<u64>,
    #[serde(default)]
    pub typing_min_ms: Option<u64>,
    #[serde(default)]
    pub typing_max_ms: Option<u64>,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            speed_multiplier: default_speed_multiplier(),
            auto_restart: false,
            restart_delay_ms: None,
            typing_min_ms: None,
            typing_max_ms: None,
        }
    }
}

fn default_speed_multiplier() -> f64 {
    1.0
}

/// A reward shown in a reward gallery step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cost_points: u32,
}

/// A field in an inline form step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// Discriminant of [`FlowStepContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlowStepKind {
    ImageUpload,
    PointsDisplay,
    RewardGallery,
    VipConfirmation,
    Form,
}

/// Payload rendered by a single flow step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowStepContent {
    ImageUpload {
        prompt: String,
        #[serde(default)]
        file_name: Option<String>,
    },
    PointsDisplay {
        points: u32,
        #[serde(default)]
        label: String,
    },
    RewardGallery {
        rewards: Vec<Reward>,
        #[serde(default)]
        selected: Option<usize>,
    },
    VipConfirmation {
        tier: String,
        #[serde(default)]
        perks: Vec<String>,
    },
    Form {
        fields: Vec<FormField>,
    },
}

impl FlowStepContent {
    pub fn kind(&self) -> FlowStepKind {
        match self {
            FlowStepContent::ImageUpload { .. } => FlowStepKind::ImageUpload,
            FlowStepContent::PointsDisplay { .. } => FlowStepKind::PointsDisplay,
            FlowStepContent::RewardGallery { .. } => FlowStepKind::RewardGallery,
            FlowStepContent::VipConfirmation { .. } => FlowStepKind::VipConfirmation,
            FlowStepContent::Form { .. } => FlowStepKind::Form,
        }
    }
}

/// One step of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    pub id: String,
    /// Simulated user-interaction pause before the step resolves. Never
    /// scaled by the playback speed.
    #[serde(default)]
    pub step_delay_ms: u64,
    pub content: FlowStepContent,
}

impl FlowStep {
    pub fn new(id: impl Into<String>, step_delay_ms: u64, content: FlowStepContent) -> Self {
        Self {
            id: id.into(),
            step_delay_ms,
            content,
        }
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// An interactive sub-experience triggered at a message index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    #[serde(default)]
    pub name: String,
    pub trigger_at_message_index: usize,
    #[serde(default)]
    pub steps: Vec<FlowStep>,
}

impl Flow {
    pub fn new(id: impl Into<String>, name: impl Into<String>, trigger_at: usize) -> Self {
        Self {
            id: FlowId(id.into()),
            name: name.into(),
            trigger_at_message_index: trigger_at,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: FlowStep) -> Self {
        self.steps.push(step);
        self
    }
}

/// A complete conversation script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub business: BusinessProfile,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub settings: ConversationSettings,
}

impl Conversation {
    /// Parse a script from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ChatreelError> {
        serde_json::from_str(json).map_err(|e| ChatreelError::Script {
            message: format!("invalid JSON script: {e}"),
        })
    }

    /// Parse a script from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ChatreelError> {
        toml::from_str(content).map_err(|e| ChatreelError::Script {
            message: format!("invalid TOML script: {e}"),
        })
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn message(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// The flow triggered at `index`. When several flows share an index the
    /// first one wins.
    pub fn flow_at(&self, index: usize) -> Option<&Flow> {
        self.flows
            .iter()
            .find(|f| f.trigger_at_message_index == index)
    }
}

/// Lifecycle state of a playback.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
    Completed,
    Error,
}

/// Ephemeral playback cursor. Owned by the engine; consumers get copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationProgress {
    pub current_index: usize,
    pub status: PlaybackStatus,
    pub elapsed: Duration,
    pub speed_multiplier: f64,
}

impl ConversationProgress {
    pub fn new(speed_multiplier: f64) -> Self {
        Self {
            current_index: 0,
            status: PlaybackStatus::Idle,
            elapsed: Duration::ZERO,
            speed_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_moves_forward() {
        assert_eq!(
            MessageStatus::Sent.advance_to(MessageStatus::Delivered),
            Some(MessageStatus::Delivered)
        );
        assert_eq!(MessageStatus::Read.advance_to(MessageStatus::Delivered), None);
        assert_eq!(MessageStatus::Read.advance_to(MessageStatus::Read), None);
    }

    #[test]
    fn blank_text_counts_as_empty() {
        assert!(MessageContent::text("   ").is_empty());
        assert!(MessageContent::default().is_empty());
        assert!(!MessageContent::text("hola").is_empty());
        let media = MessageContent::media(MediaDescriptor {
            kind: MediaKind::Image,
            url: "https://cdn.example.com/menu.png".into(),
            caption: None,
        });
        assert!(!media.is_empty());
        assert_eq!(media.preview(), "[image]");
    }

    #[test]
    fn script_parses_from_json_with_defaults() {
        let json = r#"{
            "id": "demo",
            "title": "Loyalty demo",
            "business": { "name": "Cafe Aroma", "phone_number": "+34 600 000 000" },
            "messages": [
                { "id": "m0", "sender": "user", "content": { "text": "Hi!" } },
                { "id": "m1", "sender": "business", "content": { "text": "Welcome" },
                  "flow_trigger": true, "final": true }
            ],
            "flows": [
                { "id": "f1", "trigger_at_message_index": 1, "steps": [
                    { "id": "s1", "step_delay_ms": 500,
                      "content": { "type": "points_display", "points": 50 } }
                ] }
            ]
        }"#;

        let conv = Conversation::from_json_str(json).expect("valid script");
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages[0].sender, Sender::User);
        assert!(conv.messages[1].flow_trigger);
        assert!(conv.messages[1].is_final);
        assert_eq!(conv.settings.speed_multiplier, 1.0);
        let flow = conv.flow_at(1).expect("flow at index 1");
        assert_eq!(flow.steps[0].content.kind(), FlowStepKind::PointsDisplay);
        assert_eq!(flow.steps[0].step_delay(), Duration::from_millis(500));
    }

    #[test]
    fn invalid_json_is_a_script_error() {
        let err = Conversation::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ChatreelError::Script { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn playback_status_display_is_snake_case() {
        assert_eq!(PlaybackStatus::Completed.to_string(), "completed");
        assert_eq!(Sender::Business.to_string(), "business");
    }
}
