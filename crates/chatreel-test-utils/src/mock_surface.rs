// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock render surface for deterministic capture tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chatreel_core::{ChatreelError, RenderSurface, SurfaceFrame};

/// A surface that renders a solid frame whose colour changes per capture.
///
/// Clones share state, so a test can keep one handle to detach the surface
/// while the capture session holds another.
#[derive(Debug, Clone)]
pub struct MockSurface {
    width: u32,
    height: u32,
    attached: Arc<AtomicBool>,
    captures: Arc<AtomicUsize>,
}

impl MockSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            attached: Arc::new(AtomicBool::new(true)),
            captures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Simulate the surface being removed from the render tree.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl Default for MockSurface {
    fn default() -> Self {
        Self::new(64, 96)
    }
}

impl RenderSurface for MockSurface {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn capture(&self) -> Result<SurfaceFrame, ChatreelError> {
        if !self.is_attached() {
            return Err(ChatreelError::Capture {
                message: "mock surface is detached".into(),
                source: None,
            });
        }
        let n = self.captures.fetch_add(1, Ordering::SeqCst);
        let shade = (n * 37 % 256) as u8;
        Ok(SurfaceFrame::solid(
            self.width,
            self.height,
            [shade, 255 - shade, 128, 255],
        ))
    }
}
