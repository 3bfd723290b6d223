// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background GIF encoding.
//!
//! The encoder runs on Tokio's blocking pool. Frames go in when the job is
//! created; progress comes back over a bounded channel and the result over
//! the task's join handle. Cancellation is checked before every frame and
//! resolves to [`ExportOutcome::Cancelled`], dropping the partial output.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chatreel_config::ExportConfig;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::{CapturedFrame, FrameBuffer};
use crate::error::ExportError;
use crate::options::CaptureOptions;

/// Messages sent from the encoder while it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportProgress {
    /// Frame `current` of `total` has been encoded.
    Frame { current: usize, total: usize },
    /// Encoding stopped with an error; `wait()` returns it as well.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetrics {
    pub frame_count: usize,
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    pub quality: f32,
    pub total_time: Duration,
}

/// Encoded GIF bytes. Clones share the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct GifBlob(Arc<Vec<u8>>);

impl GifBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The bytes, copied only if another clone is still alive.
    pub fn into_bytes(self) -> Vec<u8> {
        Arc::try_unwrap(self.0).unwrap_or_else(|shared| shared.as_ref().clone())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for GifBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GifBlob({} bytes)", self.0.len())
    }
}

/// A completed export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    pub file_size: usize,
    pub metrics: ExportMetrics,
    pub blob: GifBlob,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Completed(ExportResult),
    Cancelled,
}

impl ExportOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExportOutcome::Cancelled)
    }

    pub fn into_result(self) -> Option<ExportResult> {
        match self {
            ExportOutcome::Completed(result) => Some(result),
            ExportOutcome::Cancelled => None,
        }
    }
}

/// Spawns encoding jobs.
#[derive(Debug, Clone)]
pub struct GifExporter {
    progress_capacity: usize,
}

impl Default for GifExporter {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

impl GifExporter {
    pub fn new(progress_capacity: usize) -> Self {
        Self {
            progress_capacity: progress_capacity.max(1),
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.progress_capacity)
    }

    /// Encode a capture buffer with the options it was captured at.
    ///
    /// A buffer whose surface was lost is not encoded: the job reports
    /// [`ExportProgress::Failed`] and resolves to [`ExportError::Capture`].
    pub fn export_buffer(&self, buffer: FrameBuffer) -> ExportJob {
        match buffer.failure() {
            Some(err) => self.spawn(move |_, _| Err(err)),
            None => self.export(buffer.frames, buffer.options),
        }
    }

    /// Hand `frames` to a background worker. Must be called inside a Tokio
    /// runtime.
    pub fn export(&self, frames: Vec<CapturedFrame>, options: CaptureOptions) -> ExportJob {
        debug!(frames = frames.len(), fps = options.frame_rate, "export queued");
        self.spawn(move |token, tx| encode(frames, &options, token, tx))
    }

    fn spawn<F>(&self, work: F) -> ExportJob
    where
        F: FnOnce(
                &CancellationToken,
                &mpsc::Sender<ExportProgress>,
            ) -> Result<ExportOutcome, ExportError>
            + Send
            + 'static,
    {
        let (tx, rx) = mpsc::channel(self.progress_capacity);
        let token = CancellationToken::new();
        let worker_token = token.clone();

        let task = tokio::task::spawn_blocking(move || {
            let outcome = work(&worker_token, &tx);
            if let Err(err) = &outcome {
                warn!(error = %err, "gif export failed");
                let _ = tx.blocking_send(ExportProgress::Failed {
                    message: err.to_string(),
                });
            }
            outcome
        });

        ExportJob {
            token,
            progress: Some(rx),
            task: Some(task),
        }
    }
}

/// Handle to a running export. Dropping it cancels the work.
#[derive(Debug)]
pub struct ExportJob {
    token: CancellationToken,
    progress: Option<mpsc::Receiver<ExportProgress>>,
    task: Option<JoinHandle<Result<ExportOutcome, ExportError>>>,
}

impl ExportJob {
    /// Ask the worker to stop before its next frame.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Next progress message, or `None` once the worker is done.
    pub async fn progress(&mut self) -> Option<ExportProgress> {
        self.progress.as_mut()?.recv().await
    }

    /// Take the progress receiver to drive a progress bar elsewhere.
    pub fn take_progress(&mut self) -> Option<mpsc::Receiver<ExportProgress>> {
        self.progress.take()
    }

    /// Wait for the worker. Unread progress is discarded.
    pub async fn wait(mut self) -> Result<ExportOutcome, ExportError> {
        // Closing our receiver unblocks a worker waiting on a full channel.
        drop(self.progress.take());
        let Some(task) = self.task.take() else {
            return Err(ExportError::Worker("export already awaited".into()));
        };
        task.await
            .map_err(|e| ExportError::Worker(format!("encoder task panicked: {e}")))?
    }
}

impl Drop for ExportJob {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.token.cancel();
        }
    }
}

fn encode(
    frames: Vec<CapturedFrame>,
    options: &CaptureOptions,
    token: &CancellationToken,
    progress: &mpsc::Sender<ExportProgress>,
) -> Result<ExportOutcome, ExportError> {
    if frames.is_empty() {
        return Err(ExportError::Encode {
            message: "no frames to encode".into(),
        });
    }

    let started = Instant::now();
    let total = frames.len();
    let (width, height) = frames[0].image.dimensions();
    let delay = Delay::from_numer_denom_ms(1000, options.frame_rate.max(1));
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, options.encoder_speed());
        encoder.set_repeat(Repeat::Infinite)?;
        for (i, frame) in frames.into_iter().enumerate() {
            if token.is_cancelled() {
                info!(encoded = i, total, "gif export cancelled");
                return Ok(ExportOutcome::Cancelled);
            }
            encoder.encode_frame(Frame::from_parts(frame.image, 0, 0, delay))?;
            // A closed receiver just means nobody is watching.
            let _ = progress.blocking_send(ExportProgress::Frame {
                current: i + 1,
                total,
            });
        }
    }

    if token.is_cancelled() {
        info!(encoded = total, total, "gif export cancelled");
        return Ok(ExportOutcome::Cancelled);
    }

    let total_time = started.elapsed();
    info!(
        frames = total,
        bytes = bytes.len(),
        elapsed_ms = total_time.as_millis() as u64,
        "gif export completed"
    );
    Ok(ExportOutcome::Completed(ExportResult {
        file_size: bytes.len(),
        metrics: ExportMetrics {
            frame_count: total,
            frame_rate: options.frame_rate,
            width,
            height,
            quality: options.quality,
            total_time,
        },
        blob: GifBlob(Arc::new(bytes)),
    }))
}
