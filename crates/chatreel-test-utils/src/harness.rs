// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playback harness for engine integration tests.
//!
//! `PlaybackHarness` wires a [`TimelineEngine`] to an [`EventRecorder`]
//! attached before the first control call, so no event is missed. Use it
//! from `#[tokio::test(start_paused = true)]` tests: Tokio then advances
//! time on its own whenever every task is waiting on a timer.

use std::sync::Arc;
use std::time::Duration;

use chatreel_config::ChatreelConfig;
use chatreel_core::{Conversation, TriggerHook};
use chatreel_engine::{EngineError, TimelineEngine};

use crate::fixtures;
use crate::recorder::EventRecorder;

/// Builder for [`PlaybackHarness`].
pub struct PlaybackHarnessBuilder {
    conversation: Conversation,
    config: ChatreelConfig,
    hook: Option<Arc<dyn TriggerHook>>,
    seed: u64,
}

impl PlaybackHarnessBuilder {
    fn new() -> Self {
        Self {
            conversation: fixtures::three_message_flow_conversation(),
            config: fixtures::fast_config(),
            hook: None,
            seed: 42,
        }
    }

    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn with_config(mut self, config: ChatreelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn TriggerHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<PlaybackHarness, EngineError> {
        let mut engine = TimelineEngine::new(self.conversation, &self.config)?.with_seed(self.seed);
        if let Some(hook) = self.hook {
            engine = engine.with_trigger_hook(hook);
        }
        let recorder = EventRecorder::attach(engine.bus());
        Ok(PlaybackHarness { engine, recorder })
    }
}

/// Engine plus recorder.
pub struct PlaybackHarness {
    pub engine: TimelineEngine,
    pub recorder: EventRecorder,
}

impl PlaybackHarness {
    pub fn builder() -> PlaybackHarnessBuilder {
        PlaybackHarnessBuilder::new()
    }

    /// The default fixture (three messages, two-step flow) on fast timings.
    pub fn new() -> Result<Self, EngineError> {
        Self::builder().build()
    }

    /// Start and record until `conversation.completed`.
    pub async fn run_to_completion(&mut self) -> Result<Vec<&'static str>, EngineError> {
        self.engine.start()?;
        self.recorder.until("conversation.completed").await;
        Ok(self.recorder.types())
    }

    /// Let `duration` of Tokio time pass, then record what was published.
    pub async fn advance(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
        self.recorder.drain();
    }
}
