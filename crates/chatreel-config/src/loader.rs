// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./chatreel.toml` > `~/.config/chatreel/chatreel.toml` >
//! `/etc/chatreel/chatreel.toml`, with `CHATREEL_*` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ChatreelConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/chatreel/chatreel.toml";
/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "chatreel.toml";

/// Sections that `CHATREEL_<SECTION>_<KEY>` variables map onto.
const ENV_SECTIONS: &[&str] = &["log", "playback", "bus", "export"];

/// The user-level config file under the XDG config dir, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chatreel").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chatreel/chatreel.toml`
/// 3. `~/.config/chatreel/chatreel.toml`
/// 4. `./chatreel.toml`
/// 5. `CHATREEL_*` environment variables
pub fn load_config() -> Result<ChatreelConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ChatreelConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatreelConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChatreelConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatreelConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(ChatreelConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping the first `_` after a known section name to
/// a dot, so `CHATREEL_PLAYBACK_TYPING_MIN_MS` becomes
/// `playback.typing_min_ms` rather than `playback.typing.min.ms`.
fn env_provider() -> Env {
    Env::prefixed("CHATREEL_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
