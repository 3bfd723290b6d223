// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as value ranges and ordering between typing bounds.

use std::ops::RangeInclusive;

use crate::diagnostic::ConfigError;
use crate::model::ChatreelConfig;

/// Accepted export quality.
pub const QUALITY_RANGE: RangeInclusive<f32> = 0.1..=1.0;
/// Accepted capture frame rate (fps).
pub const FRAME_RATE_RANGE: RangeInclusive<u32> = 5..=30;
/// Accepted capture duration (seconds).
pub const DURATION_RANGE: RangeInclusive<u32> = 5..=60;
/// Accepted output scale.
pub const SCALE_RANGE: RangeInclusive<f32> = 0.5..=2.0;
/// Accepted playback speed multiplier.
pub const SPEED_RANGE: RangeInclusive<f64> = 0.1..=10.0;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ChatreelConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let playback = &config.playback;
    if !SPEED_RANGE.contains(&playback.speed_multiplier) {
        errors.push(ConfigError::Validation {
            message: format!(
                "playback.speed_multiplier must be within {:?}, got {}",
                SPEED_RANGE, playback.speed_multiplier
            ),
        });
    }

    if playback.typing_min_ms > playback.typing_max_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "playback.typing_min_ms ({}) must not exceed playback.typing_max_ms ({})",
                playback.typing_min_ms, playback.typing_max_ms
            ),
        });
    }

    if config.bus.capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "bus.capacity must be at least 1".to_string(),
        });
    }

    let export = &config.export;
    if !QUALITY_RANGE.contains(&export.quality) {
        errors.push(ConfigError::Validation {
            message: format!(
                "export.quality must be within {:?}, got {}",
                QUALITY_RANGE, export.quality
            ),
        });
    }

    if !FRAME_RATE_RANGE.contains(&export.frame_rate) {
        errors.push(ConfigError::Validation {
            message: format!(
                "export.frame_rate must be within {:?}, got {}",
                FRAME_RATE_RANGE, export.frame_rate
            ),
        });
    }

    if !DURATION_RANGE.contains(&export.duration_secs) {
        errors.push(ConfigError::Validation {
            message: format!(
                "export.duration_secs must be within {:?}, got {}",
                DURATION_RANGE, export.duration_secs
            ),
        });
    }

    if !SCALE_RANGE.contains(&export.scale) {
        errors.push(ConfigError::Validation {
            message: format!(
                "export.scale must be within {:?}, got {}",
                SCALE_RANGE, export.scale
            ),
        });
    }

    if export.progress_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "export.progress_capacity must be at least 1".to_string(),
        });
    }

    if export.canvas_width < 64 || export.canvas_height < 64 {
        errors.push(ConfigError::Validation {
            message: format!(
                "export canvas must be at least 64x64, got {}x{}",
                export.canvas_width, export.canvas_height
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
