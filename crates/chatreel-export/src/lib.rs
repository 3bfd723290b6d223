// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frame capture and GIF export for Chatreel playback.
//!
//! A [`CaptureSession`] samples a [`RenderSurface`](chatreel_core::RenderSurface)
//! while the timeline plays; a [`GifExporter`] encodes the buffered frames
//! on Tokio's blocking pool and reports progress over a bounded channel.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use chatreel_export::*;
//! # async fn demo() -> Result<(), ExportError> {
//! let canvas = BubbleCanvas::new(360, 640);
//! let session = FrameCapture::start(
//!     Arc::new(canvas),
//!     CaptureOptions::default(),
//!     &DeviceProfile::detect(),
//! )?;
//! let buffer = session.finish().await?;
//! let outcome = GifExporter::default().export_buffer(buffer).wait().await?;
//! if let Some(result) = outcome.into_result() {
//!     println!("{} bytes", result.file_size);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adaptive;
pub mod canvas;
pub mod capture;
pub mod encoder;
pub mod error;
pub mod options;

pub use adaptive::{Adjustment, DeviceProfile, DeviceTier, NetworkClass, adapt};
pub use canvas::BubbleCanvas;
pub use capture::{
    CaptureSession, CapturedFrame, FrameBuffer, FrameCapture, StopReason, capture_playback,
};
pub use encoder::{
    ExportJob, ExportMetrics, ExportOutcome, ExportProgress, ExportResult, GifBlob, GifExporter,
};
pub use error::ExportError;
pub use options::CaptureOptions;
