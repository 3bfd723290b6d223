// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned conversations and configurations with predictable timings.

use std::time::Duration;

use chatreel_config::ChatreelConfig;
use chatreel_core::{
    Conversation, ConversationBuilder, Flow, FlowStep, FlowStepContent, Message, Reward,
};

/// Delays used by [`fast_config`], in milliseconds.
pub const MESSAGE_DELAY_MS: u64 = 100;
pub const TYPING_MS: u64 = 50;
pub const DELIVERED_DELAY_MS: u64 = 20;
pub const READ_DELAY_MS: u64 = 30;
pub const FLOW_TRANSITION_MS: u64 = 10;
pub const RESTART_DELAY_MS: u64 = 200;

/// Step delays of the loyalty flow in [`three_message_flow_conversation`].
pub const FLOW_STEP_DELAYS_MS: [u64; 2] = [40, 60];

/// Config with short, fixed delays (typing is not randomised).
pub fn fast_config() -> ChatreelConfig {
    let mut config = ChatreelConfig::default();
    let playback = &mut config.playback;
    playback.message_delay_ms = MESSAGE_DELAY_MS;
    playback.typing_min_ms = TYPING_MS;
    playback.typing_max_ms = TYPING_MS;
    playback.delivered_delay_ms = DELIVERED_DELAY_MS;
    playback.read_delay_ms = READ_DELAY_MS;
    playback.flow_transition_delay_ms = FLOW_TRANSITION_MS;
    playback.restart_delay_ms = RESTART_DELAY_MS;
    config
}

/// Unscaled time one plain message takes from queued to read.
pub fn message_cycle() -> Duration {
    Duration::from_millis(TYPING_MS + DELIVERED_DELAY_MS + READ_DELAY_MS)
}

/// `count` alternating user/business text messages.
pub fn simple_conversation(count: usize) -> Conversation {
    let mut builder = ConversationBuilder::new("simple")
        .title("Simple chat")
        .business("Cafe Aroma", "+34 600 000 000");
    for i in 0..count {
        builder = if i % 2 == 0 {
            builder.user(format!("user message {i}"))
        } else {
            builder.business_says(format!("business reply {i}"))
        };
    }
    builder.build()
}

pub fn espresso() -> Reward {
    Reward {
        id: "espresso".into(),
        title: "Free espresso".into(),
        cost_points: 50,
    }
}

pub fn muffin() -> Reward {
    Reward {
        id: "muffin".into(),
        title: "Blueberry muffin".into(),
        cost_points: 80,
    }
}

/// Points display followed by a reward gallery, triggered at `index`.
pub fn loyalty_flow(index: usize) -> Flow {
    Flow::new("loyalty", "Loyalty rewards", index)
        .step(FlowStep::new(
            "points",
            FLOW_STEP_DELAYS_MS[0],
            FlowStepContent::PointsDisplay {
                points: 120,
                label: "Your points".into(),
            },
        ))
        .step(FlowStep::new(
            "reward",
            FLOW_STEP_DELAYS_MS[1],
            FlowStepContent::RewardGallery {
                rewards: vec![espresso(), muffin()],
                selected: Some(0),
            },
        ))
}

/// Three messages; the second triggers the two-step [`loyalty_flow`].
pub fn three_message_flow_conversation() -> Conversation {
    ConversationBuilder::new("loyalty-demo")
        .title("Loyalty demo")
        .business("Cafe Aroma", "+34 600 000 000")
        .verified()
        .message(Message::user("m0", "Hi! Do you have a loyalty program?"))
        .message(
            Message::business("m1", "Yes! Here are your points.")
                .with_flow_trigger()
                .with_gamification_trigger(),
        )
        .message(Message::business("m2", "Enjoy your espresso!").final_message())
        .flow(loyalty_flow(1))
        .build()
}

/// Like [`three_message_flow_conversation`] but the flow's gallery selects
/// a reward that does not exist, so the flow fails at step 1.
pub fn failing_flow_conversation() -> Conversation {
    let mut conversation = three_message_flow_conversation();
    if let Some(FlowStepContent::RewardGallery { selected, .. }) = conversation
        .flows
        .first_mut()
        .and_then(|f| f.steps.get_mut(1))
        .map(|s| &mut s.content)
    {
        *selected = Some(9);
    }
    conversation
}
