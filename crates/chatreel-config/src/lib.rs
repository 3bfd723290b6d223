// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Chatreel simulator.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `CHATREEL_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! ```no_run
//! use chatreel_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("typing: {}..{} ms", config.playback.typing_min_ms, config.playback.typing_max_ms);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{BusConfig, ChatreelConfig, ExportConfig, LogConfig, PlaybackConfig};

/// Load configuration from the standard hierarchy and validate it.
pub fn load_and_validate() -> Result<ChatreelConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load an explicit config file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<ChatreelConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it. Used by tests.
pub fn load_and_validate_str(toml_content: &str) -> Result<ChatreelConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<ChatreelConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ChatreelConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(
                speed = config.playback.speed_multiplier,
                bus_capacity = config.bus.capacity,
                "configuration loaded"
            );
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read every config file that exists so diagnostics can point into it.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from(loader::SYSTEM_CONFIG_PATH)];
    if let Some(user) = loader::user_config_path() {
        candidates.push(user);
    }
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG_FILE))
            .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.into()),
    );

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
