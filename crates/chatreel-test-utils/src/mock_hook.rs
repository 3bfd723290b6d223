// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording trigger hook.

use std::sync::Mutex;

use chatreel_core::{ChatreelError, Message, TriggerHook, TriggerKind};

/// Records every trigger call and optionally fails (or panics on) the first
/// call at one index.
#[derive(Debug, Default)]
pub struct MockHook {
    calls: Mutex<Vec<(TriggerKind, usize)>>,
    fail_at: Mutex<Option<usize>>,
    panics: bool,
}

impl MockHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail once when a trigger fires at `index`.
    pub fn failing_at(index: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_at: Mutex::new(Some(index)),
            panics: false,
        }
    }

    /// Panic once when a trigger fires at `index`.
    pub fn panicking_at(index: usize) -> Self {
        Self {
            panics: true,
            ..Self::failing_at(index)
        }
    }

    pub fn calls(&self) -> Vec<(TriggerKind, usize)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl TriggerHook for MockHook {
    fn on_trigger(
        &self,
        kind: TriggerKind,
        index: usize,
        _message: &Message,
    ) -> Result<(), ChatreelError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((kind, index));
        }
        let mut fail_at = match self.fail_at.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *fail_at == Some(index) {
            *fail_at = None;
            if self.panics {
                drop(fail_at);
                panic!("{kind} backend crashed");
            }
            return Err(ChatreelError::Playback {
                message: format!("{kind} backend unavailable"),
                recoverable: true,
            });
        }
        Ok(())
    }
}
