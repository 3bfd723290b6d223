// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Script file loading.

use std::path::Path;

use chatreel_core::{ChatreelError, Conversation};
use tracing::debug;

/// Read a conversation script. `.toml` files are parsed as TOML, anything
/// else as JSON.
pub fn load_script(path: &Path) -> Result<Conversation, ChatreelError> {
    let content = std::fs::read_to_string(path).map_err(|e| ChatreelError::Script {
        message: format!("cannot read {}: {e}", path.display()),
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let conversation = if is_toml {
        Conversation::from_toml_str(&content)?
    } else {
        Conversation::from_json_str(&content)?
    };

    debug!(
        path = %path.display(),
        conversation = %conversation.id,
        messages = conversation.len(),
        "script loaded"
    );
    Ok(conversation)
}
