// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation-checked timer bookkeeping.
//!
//! Every scheduled callback captures the generation current at scheduling
//! time. Cancelling bumps the generation and aborts the tracked tasks; a
//! callback that still runs (it may already have been past its sleep)
//! compares generations under the engine lock and drops itself.

use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Abort handles for outstanding timer tasks plus the current generation.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    generation: u64,
    handles: Vec<AbortHandle>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a callback scheduled in `generation` may still run.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Keep `handle` so it can be aborted later.
    pub fn track(&mut self, handle: AbortHandle) {
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle);
    }

    /// Number of timer tasks that have not finished.
    pub fn outstanding(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Abort everything outstanding and invalidate the current generation.
    pub fn cancel_all(&mut self) -> u64 {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

/// The one step the timeline is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTimer<S> {
    pub step: S,
    pub delay: Duration,
    pub due: Instant,
}

impl<S: Copy> PendingTimer<S> {
    pub fn new(step: S, delay: Duration) -> Self {
        Self {
            step,
            delay,
            due: Instant::now() + delay,
        }
    }

    /// Delay left before the step would have fired.
    pub fn remaining(&self) -> Duration {
        self.due.saturating_duration_since(Instant::now())
    }
}
