// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic sampling of a render surface into an in-memory frame buffer.
//!
//! [`FrameCapture::start`] adapts the options to the device, then spawns a
//! sampler task on a Tokio interval. The session owns the buffer; callers
//! get it back from [`CaptureSession::stop`] or [`CaptureSession::finish`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chatreel_bus::{EventBus, EventFilter, EventKind, EventStream};
use chatreel_core::RenderSurface;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adaptive::{Adjustment, DeviceProfile, adapt};
use crate::error::ExportError;
use crate::options::CaptureOptions;

/// One sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub index: usize,
    /// Offset from the start of the capture.
    pub at: Duration,
    pub image: RgbaImage,
}

/// Why sampling ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was called or playback ended.
    Requested,
    /// `frame_rate × duration` frames were buffered.
    FrameBudget,
    /// The surface could not be sampled any more.
    SurfaceLost(String),
}

/// Frames plus the options they were captured with.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub frames: Vec<CapturedFrame>,
    pub options: CaptureOptions,
    pub adjustments: Vec<Adjustment>,
    pub stop_reason: StopReason,
}

impl FrameBuffer {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The capture error, if sampling ended because the surface was lost.
    pub fn failure(&self) -> Option<ExportError> {
        match &self.stop_reason {
            StopReason::SurfaceLost(message) => Some(ExportError::Capture {
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    frames: Vec<CapturedFrame>,
    paused: bool,
    stop_reason: Option<StopReason>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Entry point for capture sessions.
pub struct FrameCapture;

impl FrameCapture {
    /// Validate `options`, apply the device caps and begin sampling.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        surface: Arc<dyn RenderSurface>,
        options: CaptureOptions,
        profile: &DeviceProfile,
    ) -> Result<CaptureSession, ExportError> {
        options.validate()?;
        if !surface.is_attached() {
            return Err(ExportError::Capture {
                message: format!("surface `{}` is not attached", surface.name()),
            });
        }

        let (effective, adjustments) = adapt(options, profile);
        let shared = Arc::new(Mutex::new(Shared::default()));
        let stop = CancellationToken::new();
        let surface_name = surface.name().to_string();

        info!(
            surface = %surface_name,
            fps = effective.frame_rate,
            duration_secs = effective.duration_secs,
            quality = effective.quality,
            scale = effective.scale,
            adjusted = adjustments.len(),
            "frame capture started"
        );

        let task = tokio::spawn(sample(surface, effective, shared.clone(), stop.clone()));

        Ok(CaptureSession {
            surface_name,
            options: effective,
            adjustments,
            shared,
            stop,
            task: Some(task),
        })
    }
}

/// A running capture. Dropping it stops sampling.
pub struct CaptureSession {
    surface_name: String,
    options: CaptureOptions,
    adjustments: Vec<Adjustment>,
    shared: Arc<Mutex<Shared>>,
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("surface", &self.surface_name)
            .field("options", &self.options)
            .field("frames", &self.frame_count())
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Effective options after adaptive downgrades.
    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Downgrades applied for the device profile.
    pub fn adjustments(&self) -> &[Adjustment] {
        &self.adjustments
    }

    pub fn frame_count(&self) -> usize {
        lock(&self.shared).frames.len()
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.shared).paused
    }

    /// Skip samples until [`resume`](Self::resume).
    pub fn pause(&self) {
        lock(&self.shared).paused = true;
        debug!(surface = %self.surface_name, "capture paused");
    }

    pub fn resume(&self) {
        lock(&self.shared).paused = false;
        debug!(surface = %self.surface_name, "capture resumed");
    }

    /// Whether the sampler has ended on its own or been stopped.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Resolves once the sampler task has ended.
    pub async fn ended(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if let Err(err) = task.await {
                warn!(surface = %self.surface_name, error = %err, "capture task failed");
            }
            self.task = None;
        }
    }

    /// Halt sampling and return what was buffered.
    pub async fn stop(mut self) -> FrameBuffer {
        self.stop.cancel();
        self.ended().await;
        self.take_buffer()
    }

    /// Wait for sampling to end by itself (frame budget reached or surface
    /// lost) and return the buffer. A lost surface is an error.
    pub async fn finish(mut self) -> Result<FrameBuffer, ExportError> {
        self.ended().await;
        let buffer = self.take_buffer();
        match buffer.failure() {
            Some(err) => Err(err),
            None => Ok(buffer),
        }
    }

    /// Follow the conversation on `bus` with [`capture_playback`] on a new
    /// task. The task yields the buffer once playback completes or resets.
    pub fn follow(self, bus: &EventBus) -> JoinHandle<FrameBuffer> {
        let events = bus.stream(EventFilter::type_prefix("conversation"));
        tokio::spawn(capture_playback(self, events))
    }

    fn take_buffer(&mut self) -> FrameBuffer {
        let mut shared = lock(&self.shared);
        let frames = std::mem::take(&mut shared.frames);
        let stop_reason = shared.stop_reason.take().unwrap_or(StopReason::Requested);
        info!(
            surface = %self.surface_name,
            frames = frames.len(),
            reason = ?stop_reason,
            "frame capture stopped"
        );
        FrameBuffer {
            frames,
            options: self.options,
            adjustments: std::mem::take(&mut self.adjustments),
            stop_reason,
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

async fn sample(
    surface: Arc<dyn RenderSurface>,
    options: CaptureOptions,
    shared: Arc<Mutex<Shared>>,
    stop: CancellationToken,
) {
    let target = options.target_frames();
    let mut ticker = tokio::time::interval(options.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let started = Instant::now();
    let mut size: Option<(u32, u32)> = None;

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if lock(&shared).paused {
            continue;
        }

        let sampler = Arc::clone(&surface);
        let grabbed = tokio::task::spawn_blocking(move || grab(sampler.as_ref(), &options, size))
            .await
            .unwrap_or_else(|e| Err(format!("capture worker failed: {e}")));
        let image = match grabbed {
            Ok(image) => image,
            Err(message) => {
                warn!(surface = %surface.name(), error = %message, "surface capture failed");
                lock(&shared).stop_reason = Some(StopReason::SurfaceLost(message));
                return;
            }
        };
        if size.is_none() {
            size = Some(image.dimensions());
        }

        let mut state = lock(&shared);
        let index = state.frames.len();
        state.frames.push(CapturedFrame {
            index,
            at: started.elapsed(),
            image,
        });
        if state.frames.len() >= target {
            state.stop_reason = Some(StopReason::FrameBudget);
            return;
        }
    }

    let mut state = lock(&shared);
    if state.stop_reason.is_none() {
        state.stop_reason = Some(StopReason::Requested);
    }
}

/// Sample the surface once. Every frame after the first is fitted to the
/// first frame's size so the encoder sees a constant canvas. Runs on the
/// blocking pool.
fn grab(
    surface: &dyn RenderSurface,
    options: &CaptureOptions,
    size: Option<(u32, u32)>,
) -> Result<RgbaImage, String> {
    if !surface.is_attached() {
        return Err(format!("surface `{}` was detached", surface.name()));
    }
    let frame = surface.capture().map_err(|e| e.to_string())?;
    if !frame.is_well_formed() {
        return Err(format!(
            "surface `{}` returned a malformed {}x{} frame",
            surface.name(),
            frame.width,
            frame.height
        ));
    }
    let (width, height) = (frame.width, frame.height);
    let image = RgbaImage::from_raw(width, height, frame.rgba)
        .ok_or_else(|| format!("frame buffer does not match {width}x{height}"))?;

    let (target_w, target_h) = size.unwrap_or_else(|| {
        (
            options.scaled_dimension(width),
            options.scaled_dimension(height),
        )
    });
    if (target_w, target_h) == (width, height) {
        Ok(image)
    } else {
        Ok(imageops::resize(&image, target_w, target_h, FilterType::Triangle))
    }
}

/// Bind a capture session to a playback: pause and resume with the
/// conversation, stop on completion or reset.
///
/// `events` should include at least the `conversation.*` events.
pub async fn capture_playback(mut session: CaptureSession, mut events: EventStream) -> FrameBuffer {
    loop {
        tokio::select! {
            event = events.recv() => match event.map(|e| e.kind) {
                Some(EventKind::ConversationPaused { .. }) => session.pause(),
                Some(EventKind::ConversationResumed { .. }) => session.resume(),
                Some(EventKind::ConversationCompleted { .. } | EventKind::ConversationReset { .. })
                | None => break,
                Some(_) => {}
            },
            () = session.ended() => break,
        }
    }
    session.stop().await
}
