// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chatreel simulator.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Chatreel configuration.
///
/// Every section is optional and defaults to values that produce a
/// natural-looking playback at 1x speed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatreelConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Timeline pacing.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Event bus settings.
    #[serde(default)]
    pub bus: BusConfig,

    /// Frame capture and GIF export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Timeline pacing. All delays are at 1x speed; the engine divides them by
/// the active speed multiplier (flow step delays excepted).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Pause between one message being read and the next being queued.
    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,

    /// Lower bound of the randomised typing indicator duration.
    #[serde(default = "default_typing_min_ms")]
    pub typing_min_ms: u64,

    /// Upper bound of the randomised typing indicator duration.
    #[serde(default = "default_typing_max_ms")]
    pub typing_max_ms: u64,

    /// Delay between `sent` and `delivered`.
    #[serde(default = "default_delivered_delay_ms")]
    pub delivered_delay_ms: u64,

    /// Delay between `delivered` and `read`.
    #[serde(default = "default_read_delay_ms")]
    pub read_delay_ms: u64,

    /// Delay before an auto-restarting conversation plays again.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,

    /// Pause after a flow resolves before main playback continues.
    #[serde(default = "default_flow_transition_delay_ms")]
    pub flow_transition_delay_ms: u64,

    /// Initial speed multiplier (scripts may override).
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,

    /// Emit `debug.state_snapshot` events on every status change.
    #[serde(default)]
    pub debug_events: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            message_delay_ms: default_message_delay_ms(),
            typing_min_ms: default_typing_min_ms(),
            typing_max_ms: default_typing_max_ms(),
            delivered_delay_ms: default_delivered_delay_ms(),
            read_delay_ms: default_read_delay_ms(),
            restart_delay_ms: default_restart_delay_ms(),
            flow_transition_delay_ms: default_flow_transition_delay_ms(),
            speed_multiplier: default_speed_multiplier(),
            debug_events: false,
        }
    }
}

impl PlaybackConfig {
    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }

    pub fn delivered_delay(&self) -> Duration {
        Duration::from_millis(self.delivered_delay_ms)
    }

    pub fn read_delay(&self) -> Duration {
        Duration::from_millis(self.read_delay_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn flow_transition_delay(&self) -> Duration {
        Duration::from_millis(self.flow_transition_delay_ms)
    }
}

fn default_message_delay_ms() -> u64 {
    1200
}

fn default_typing_min_ms() -> u64 {
    800
}

fn default_typing_max_ms() -> u64 {
    1800
}

fn default_delivered_delay_ms() -> u64 {
    300
}

fn default_read_delay_ms() -> u64 {
    600
}

fn default_restart_delay_ms() -> u64 {
    4000
}

fn default_flow_transition_delay_ms() -> u64 {
    500
}

fn default_speed_multiplier() -> f64 {
    1.0
}

/// Event bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Broadcast channel capacity. Subscribers further behind than this lag
    /// and skip events.
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}

fn default_bus_capacity() -> usize {
    1024
}

/// Frame capture and GIF export configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Encoding quality, 0.1 (smallest) to 1.0 (best).
    #[serde(default = "default_quality")]
    pub quality: f32,

    /// Capture frame rate, 5 to 30 fps.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Capture duration in seconds, 5 to 60.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,

    /// Output scale factor, 0.5 to 2.0.
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Downgrade quality/frame rate on constrained devices before capturing.
    #[serde(default = "default_adaptive")]
    pub adaptive: bool,

    /// Capacity of the encoder progress channel.
    #[serde(default = "default_progress_capacity")]
    pub progress_capacity: usize,

    /// Width of the software chat canvas used by the CLI.
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,

    /// Height of the software chat canvas used by the CLI.
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            frame_rate: default_frame_rate(),
            duration_secs: default_duration_secs(),
            scale: default_scale(),
            adaptive: default_adaptive(),
            progress_capacity: default_progress_capacity(),
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
        }
    }
}

fn default_quality() -> f32 {
    0.8
}

fn default_frame_rate() -> u32 {
    15
}

fn default_duration_secs() -> u32 {
    15
}

fn default_scale() -> f32 {
    1.0
}

fn default_adaptive() -> bool {
    true
}

fn default_progress_capacity() -> usize {
    16
}

fn default_canvas_width() -> u32 {
    360
}

fn default_canvas_height() -> u32 {
    640
}
