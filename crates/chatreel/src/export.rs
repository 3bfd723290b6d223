// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatreel export`: play a script on the software canvas, capture it and
//! write an animated GIF.

use std::path::PathBuf;
use std::sync::Arc;

use chatreel_bus::{EventFilter, EventKind};
use chatreel_config::ChatreelConfig;
use chatreel_core::{ChatreelError, Conversation, PlaybackStatus};
use chatreel_engine::TimelineEngine;
use chatreel_export::{
    BubbleCanvas, CaptureOptions, DeviceProfile, ExportOutcome, ExportProgress, FrameBuffer,
    FrameCapture, GifExporter, NetworkClass,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::play::LoggingHook;

/// Command-line overrides for one export.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub out: PathBuf,
    pub quality: Option<f32>,
    pub fps: Option<u32>,
    pub duration: Option<u32>,
    pub scale: Option<f32>,
    pub speed: Option<f64>,
    pub network: Option<NetworkClass>,
    pub save_data: bool,
}

impl ExportRequest {
    /// Configured options with this request's overrides applied.
    fn options(&self, config: &ChatreelConfig) -> CaptureOptions {
        let mut options = CaptureOptions::from_config(&config.export);
        if let Some(quality) = self.quality {
            options.quality = quality;
        }
        if let Some(fps) = self.fps {
            options.frame_rate = fps;
        }
        if let Some(duration) = self.duration {
            options.duration_secs = duration;
        }
        if let Some(scale) = self.scale {
            options.scale = scale;
        }
        options
    }

    fn profile(&self, config: &ChatreelConfig) -> DeviceProfile {
        let base = if config.export.adaptive {
            DeviceProfile::detect()
        } else {
            DeviceProfile::unconstrained()
        };
        base.with_network(self.network.unwrap_or_default())
            .with_save_data(self.save_data)
    }
}

pub async fn run_export(
    config: &ChatreelConfig,
    conversation: Conversation,
    request: ExportRequest,
) -> Result<(), ChatreelError> {
    let options = request.options(config);
    let profile = request.profile(config);
    let buffer = capture_conversation(config, conversation, options, &profile, request.speed).await?;

    for adjustment in &buffer.adjustments {
        println!(
            "  adjusted {} from {} to {} for this device",
            adjustment.field, adjustment.from, adjustment.to
        );
    }

    let exporter = GifExporter::from_config(&config.export);
    let mut job = exporter.export_buffer(buffer);
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("  encoding [{bar:30}] {pos}/{len} frames")
            .map_err(|e| ChatreelError::Internal(format!("invalid progress template: {e}")))?
            .progress_chars("=> "),
    );

    if let Some(mut progress) = job.take_progress() {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(update) = progress.recv().await {
                match update {
                    ExportProgress::Frame { current, total } => {
                        bar.set_length(total as u64);
                        bar.set_position(current as u64);
                    }
                    ExportProgress::Failed { message } => {
                        bar.abandon_with_message(message);
                        return;
                    }
                }
            }
        });
    }

    let outcome = job.wait().await?;
    bar.finish_and_clear();

    let result = match outcome {
        ExportOutcome::Completed(result) => result,
        ExportOutcome::Cancelled => {
            return Err(ChatreelError::Encode {
                message: "export was cancelled".into(),
                source: None,
            });
        }
    };

    tokio::fs::write(&request.out, result.blob.as_bytes()).await?;
    info!(
        path = %request.out.display(),
        bytes = result.file_size,
        frames = result.metrics.frame_count,
        "gif written"
    );
    println!(
        "  wrote {} ({} frames, {}x{} at {} fps, {} KiB, quality {:.2}, {} ms)",
        request.out.display(),
        result.metrics.frame_count,
        result.metrics.width,
        result.metrics.height,
        result.metrics.frame_rate,
        result.file_size.div_ceil(1024),
        result.metrics.quality,
        result.metrics.total_time.as_millis()
    );
    Ok(())
}

/// Play `conversation` on a fresh [`BubbleCanvas`] and capture it until
/// playback completes or the frame budget runs out. A lost surface is left
/// in the buffer for the exporter to report.
pub async fn capture_conversation(
    config: &ChatreelConfig,
    conversation: Conversation,
    options: CaptureOptions,
    profile: &DeviceProfile,
    speed: Option<f64>,
) -> Result<FrameBuffer, ChatreelError> {
    let engine = TimelineEngine::new(conversation, config)?.with_trigger_hook(Arc::new(LoggingHook));
    if let Some(speed) = speed {
        engine.set_speed(speed)?;
    }

    let canvas = BubbleCanvas::new(config.export.canvas_width, config.export.canvas_height);
    let _follow = canvas.follow(engine.bus());

    // Capture only shows the happy path; recoverable errors resume at once.
    let resumer = engine.clone();
    let _resume = engine.bus().subscribe(
        EventFilter::pattern("conversation.error"),
        move |event| {
            if let EventKind::ConversationError {
                recoverable: true, ..
            } = event.kind
                && let Err(err) = resumer.resume()
            {
                warn!(error = %err, "could not resume after a recoverable error");
            }
        },
    );

    let session = FrameCapture::start(Arc::new(canvas), options, profile)?;
    let capture = session.follow(engine.bus());
    engine.start()?;

    let buffer = capture
        .await
        .map_err(|e| ChatreelError::Internal(format!("capture task failed: {e}")))?;
    if engine.status() == PlaybackStatus::Error {
        warn!("playback stopped with an error; exporting what was captured");
    }
    engine.reset();
    Ok(buffer)
}
