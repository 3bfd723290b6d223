// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams between the engine and its hosts.
//!
//! These are synchronous on purpose: both are invoked from inside timer
//! callbacks and capture ticks, which never await while holding state.

pub mod hook;
pub mod surface;

pub use hook::{TriggerHook, TriggerKind};
pub use surface::{RenderSurface, SurfaceFrame};
