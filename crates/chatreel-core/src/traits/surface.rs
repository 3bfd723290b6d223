// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Render surface trait sampled by the frame capture pipeline.

use crate::error::ChatreelError;

/// A raw RGBA8 snapshot of a render surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl SurfaceFrame {
    /// A frame filled with a single colour.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut buf = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            buf.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            rgba: buf,
        }
    }

    /// True when the pixel buffer matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

/// Something that can be sampled into frames (a DOM node, a canvas, a
/// software renderer).
pub trait RenderSurface: Send + Sync + 'static {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Whether the surface is still part of the render tree. Capturing a
    /// detached surface fails.
    fn is_attached(&self) -> bool;

    /// Snapshot the current contents.
    fn capture(&self) -> Result<SurfaceFrame, ChatreelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_frame_has_expected_length() {
        let frame = SurfaceFrame::solid(4, 3, [1, 2, 3, 255]);
        assert!(frame.is_well_formed());
        assert_eq!(frame.rgba.len(), 48);
        assert_eq!(&frame.rgba[..4], &[1, 2, 3, 255]);
    }

    #[test]
    fn mismatched_buffer_is_not_well_formed() {
        let frame = SurfaceFrame {
            width: 2,
            height: 2,
            rgba: vec![0; 3],
        };
        assert!(!frame.is_well_formed());
    }
}
