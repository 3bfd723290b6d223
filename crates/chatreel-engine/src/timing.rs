// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolved playback delays for one conversation.

use std::time::Duration;

use chatreel_config::PlaybackConfig;
use chatreel_config::validation::SPEED_RANGE;
use chatreel_core::ConversationSettings;
use rand::Rng;

/// Longest delay a timer is ever armed with.
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Lower bound accepted by `set_speed`.
pub const MIN_SPEED: f64 = *SPEED_RANGE.start();

/// Upper bound accepted by `set_speed`.
pub const MAX_SPEED: f64 = *SPEED_RANGE.end();

/// Unscaled delays. Per-script settings win over engine config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub message_delay: Duration,
    pub typing_min: Duration,
    pub typing_max: Duration,
    pub delivered_delay: Duration,
    pub read_delay: Duration,
    pub restart_delay: Duration,
    pub flow_transition_delay: Duration,
}

impl Timings {
    pub fn resolve(config: &PlaybackConfig, settings: &ConversationSettings) -> Self {
        let typing_min = settings.typing_min_ms.unwrap_or(config.typing_min_ms);
        let typing_max = settings.typing_max_ms.unwrap_or(config.typing_max_ms);
        Self {
            message_delay: config.message_delay(),
            typing_min: Duration::from_millis(typing_min.min(typing_max)),
            typing_max: Duration::from_millis(typing_max.max(typing_min)),
            delivered_delay: config.delivered_delay(),
            read_delay: config.read_delay(),
            restart_delay: settings
                .restart_delay_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.restart_delay()),
            flow_transition_delay: config.flow_transition_delay(),
        }
    }

    /// Uniform in `[typing_min, typing_max]`, unscaled.
    pub fn typing_duration(&self, rng: &mut impl Rng) -> Duration {
        if self.typing_min >= self.typing_max {
            return self.typing_min;
        }
        let millis = rng.gen_range(self.typing_min.as_millis()..=self.typing_max.as_millis());
        Duration::from_millis(millis as u64)
    }
}

/// Whether `speed` is an acceptable multiplier. Same range as
/// `playback.speed_multiplier` in config.
pub fn valid_speed(speed: f64) -> bool {
    SPEED_RANGE.contains(&speed)
}

/// `delay / speed`, capped at [`MAX_DELAY`].
pub fn scaled(delay: Duration, speed: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() / speed)
        .unwrap_or(MAX_DELAY)
        .min(MAX_DELAY)
}

/// Initial speed for a conversation: engine default times script multiplier.
pub fn initial_speed(config: &PlaybackConfig, settings: &ConversationSettings) -> f64 {
    let speed = config.speed_multiplier * settings.speed_multiplier;
    if speed.is_finite() && speed > 0.0 {
        speed.clamp(MIN_SPEED, MAX_SPEED)
    } else {
        1.0
    }
}
