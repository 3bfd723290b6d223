// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Chatreel integration tests.
//!
//! Provides fixtures, mock adapters and a playback harness for fast,
//! deterministic tests that run on Tokio's paused clock.
//!
//! # Components
//!
//! - [`fixtures`] - Canned conversations and short-delay configs
//! - [`MockSurface`] - Render surface with a detach switch
//! - [`MockHook`] - Trigger hook that records calls and can fail once
//! - [`EventRecorder`] - Ordered capture of bus events
//! - [`PlaybackHarness`] - Engine plus recorder

pub mod fixtures;
pub mod harness;
pub mod mock_hook;
pub mod mock_surface;
pub mod recorder;

pub use harness::{PlaybackHarness, PlaybackHarnessBuilder};
pub use mock_hook::MockHook;
pub use mock_surface::MockSurface;
pub use recorder::{EventRecorder, event_types};
