// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capture options and the quantities derived from them.

use std::time::Duration;

use chatreel_config::ExportConfig;
use chatreel_config::validation::{DURATION_RANGE, FRAME_RATE_RANGE, QUALITY_RANGE, SCALE_RANGE};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// What to sample and how densely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureOptions {
    /// 0.1 (smallest file) to 1.0 (best colours).
    pub quality: f32,
    /// Frames per second, 5 to 30.
    pub frame_rate: u32,
    /// Seconds of playback to capture, 5 to 60.
    pub duration_secs: u32,
    /// Output scale relative to the surface, 0.5 to 2.0.
    pub scale: f32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

impl CaptureOptions {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            quality: config.quality,
            frame_rate: config.frame_rate,
            duration_secs: config.duration_secs,
            scale: config.scale,
        }
    }

    /// Check every field and report all problems at once.
    pub fn validate(&self) -> Result<(), ExportError> {
        let mut problems = Vec::new();
        if !QUALITY_RANGE.contains(&self.quality) {
            problems.push(format!(
                "quality must be within {QUALITY_RANGE:?}, got {}",
                self.quality
            ));
        }
        if !FRAME_RATE_RANGE.contains(&self.frame_rate) {
            problems.push(format!(
                "frame_rate must be within {FRAME_RATE_RANGE:?}, got {}",
                self.frame_rate
            ));
        }
        if !DURATION_RANGE.contains(&self.duration_secs) {
            problems.push(format!(
                "duration_secs must be within {DURATION_RANGE:?}, got {}",
                self.duration_secs
            ));
        }
        if !SCALE_RANGE.contains(&self.scale) {
            problems.push(format!(
                "scale must be within {SCALE_RANGE:?}, got {}",
                self.scale
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ExportError::InvalidOptions(problems.join("; ")))
        }
    }

    /// Time between two samples.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }

    /// Number of frames a full capture holds.
    pub fn target_frames(&self) -> usize {
        (self.frame_rate as usize) * (self.duration_secs as usize)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_secs))
    }

    /// GIF encoder speed: 1 (slowest, best palette) to 30 (fastest).
    pub fn encoder_speed(&self) -> i32 {
        let quality = self.quality.clamp(0.0, 1.0);
        let speed = 1.0 + (1.0 - quality) * 29.0;
        (speed.round() as i32).clamp(1, 30)
    }

    /// Scale a surface dimension, never below one pixel.
    pub fn scaled_dimension(&self, value: u32) -> u32 {
        ((value as f32) * self.scale).round().max(1.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(CaptureOptions::default().validate().is_ok());
    }

    #[test]
    fn reports_every_bad_field() {
        let options = CaptureOptions {
            quality: 0.0,
            frame_rate: 60,
            duration_secs: 2,
            scale: 3.0,
        };
        let err = options.validate().unwrap_err().to_string();
        for field in ["quality", "frame_rate", "duration_secs", "scale"] {
            assert!(err.contains(field), "{field} missing from {err}");
        }
    }

    #[test]
    fn derived_values() {
        let options = CaptureOptions {
            quality: 1.0,
            frame_rate: 10,
            duration_secs: 6,
            scale: 0.5,
        };
        assert_eq!(options.frame_interval(), Duration::from_millis(100));
        assert_eq!(options.target_frames(), 60);
        assert_eq!(options.encoder_speed(), 1);
        assert_eq!(options.scaled_dimension(101), 51);

        let low = CaptureOptions {
            quality: 0.1,
            ..options
        };
        assert_eq!(low.encoder_speed(), 27);
    }
}
