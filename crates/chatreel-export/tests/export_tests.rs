// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capture and export pipeline tests.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use chatreel_bus::EventFilter;
use chatreel_core::RenderSurface;
use chatreel_engine::TimelineEngine;
use chatreel_export::{
    BubbleCanvas, CaptureOptions, CapturedFrame, DeviceProfile, ExportError, ExportOutcome,
    ExportProgress, FrameCapture, GifExporter, StopReason, capture_playback,
};
use chatreel_test_utils::MockSurface;
use chatreel_test_utils::fixtures::{fast_config, simple_conversation};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, RgbaImage};

fn options(frame_rate: u32, duration_secs: u32) -> CaptureOptions {
    CaptureOptions {
        quality: 0.8,
        frame_rate,
        duration_secs,
        scale: 1.0,
    }
}

fn surface_frames(n: usize) -> Vec<CapturedFrame> {
    let surface = MockSurface::new(32, 48);
    (0..n)
        .map(|index| {
            let frame = surface.capture().unwrap();
            CapturedFrame {
                index,
                at: Duration::from_millis(index as u64 * 100),
                image: RgbaImage::from_raw(frame.width, frame.height, frame.rgba).unwrap(),
            }
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn full_capture_holds_frame_rate_times_duration() {
    let surface = MockSurface::default();
    let session = FrameCapture::start(
        Arc::new(surface.clone()),
        options(5, 5),
        &DeviceProfile::unconstrained(),
    )
    .unwrap();

    let buffer = session.finish().await.unwrap();
    assert_eq!(buffer.stop_reason, StopReason::FrameBudget);
    assert_eq!(buffer.len(), 25);
    assert_eq!(surface.capture_count(), 25);
    let last = buffer.frames.last().unwrap();
    assert_eq!(last.index, 24);
    assert!(last.at >= Duration::from_millis(4800));
}

#[tokio::test(start_paused = true)]
async fn completed_export_is_a_decodable_gif() {
    let session = FrameCapture::start(
        Arc::new(MockSurface::default()),
        options(5, 5),
        &DeviceProfile::unconstrained(),
    )
    .unwrap();
    let buffer = session.finish().await.unwrap();
    let expected = buffer.options.target_frames();

    let outcome = GifExporter::new(64).export_buffer(buffer).wait().await.unwrap();
    let result = outcome.into_result().expect("completed export");
    assert!(result.metrics.frame_count.abs_diff(expected) <= 1);
    assert_eq!(result.metrics.quality, 0.8);
    assert_eq!(result.metrics.frame_rate, 5);
    assert_eq!((result.metrics.width, result.metrics.height), (64, 96));
    assert_eq!(result.file_size, result.blob.len());

    let bytes = result.blob.into_bytes();
    assert_eq!(&bytes[..6], b"GIF89a");
    let decoder = GifDecoder::new(Cursor::new(bytes)).unwrap();
    let frames = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(frames.len(), expected);
    assert_eq!(frames[0].buffer().dimensions(), (64, 96));
}

#[tokio::test]
async fn cancel_mid_encode_resolves_cancelled() {
    let mut job = GifExporter::new(1).export(surface_frames(120), options(10, 12));

    let first = job.progress().await;
    assert_eq!(
        first,
        Some(ExportProgress::Frame {
            current: 1,
            total: 120
        })
    );
    job.cancel();

    let outcome = job.wait().await.unwrap();
    assert_eq!(outcome, ExportOutcome::Cancelled);
    assert!(outcome.into_result().is_none());
}

#[tokio::test]
async fn progress_counts_up_to_total() {
    let mut job = GifExporter::new(4).export(surface_frames(6), options(10, 5));
    let mut rx = job.take_progress().unwrap();
    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(progress) = rx.recv().await {
            seen.push(progress);
        }
        seen
    });

    let outcome = job.wait().await.unwrap();
    assert!(!outcome.is_cancelled());
    let seen = collector.await.unwrap();
    let expected: Vec<_> = (1..=6)
        .map(|current| ExportProgress::Frame { current, total: 6 })
        .collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn exporting_nothing_is_an_encode_error() {
    let err = GifExporter::default()
        .export(Vec::new(), options(10, 5))
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Encode { .. }));
}

#[tokio::test(start_paused = true)]
async fn detached_surface_fails_the_capture() {
    let surface = MockSurface::default();
    let session = FrameCapture::start(
        Arc::new(surface.clone()),
        options(10, 10),
        &DeviceProfile::unconstrained(),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(550)).await;
    surface.detach();

    let err = session.finish().await.unwrap_err();
    assert!(matches!(err, ExportError::Capture { .. }));
    assert!(surface.capture_count() > 0);
}

#[tokio::test]
async fn start_rejects_bad_options_and_detached_surfaces() {
    let bad = CaptureOptions {
        frame_rate: 100,
        ..options(10, 10)
    };
    let err = FrameCapture::start(
        Arc::new(MockSurface::default()),
        bad,
        &DeviceProfile::unconstrained(),
    )
    .unwrap_err();
    assert!(matches!(err, ExportError::InvalidOptions(_)));

    let surface = MockSurface::default();
    surface.detach();
    let err = FrameCapture::start(
        Arc::new(surface),
        options(10, 10),
        &DeviceProfile::unconstrained(),
    )
    .unwrap_err();
    assert!(matches!(err, ExportError::Capture { .. }));
}

#[tokio::test(start_paused = true)]
async fn constrained_devices_are_downgraded_before_sampling() {
    let requested = CaptureOptions {
        quality: 1.0,
        frame_rate: 24,
        duration_secs: 5,
        scale: 1.0,
    };
    let profile = DeviceProfile::new(4, 16 * 1024 * 1024 * 1024);
    let session =
        FrameCapture::start(Arc::new(MockSurface::default()), requested, &profile).unwrap();

    assert_eq!(session.options().frame_rate, 12);
    assert_eq!(session.options().quality, 0.6);
    assert_eq!(session.adjustments().len(), 2);

    let buffer = session.finish().await.unwrap();
    assert_eq!(buffer.len(), 60);
    assert_eq!(buffer.adjustments.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn capture_follows_playback_until_completion() {
    let engine = TimelineEngine::new(simple_conversation(3), &fast_config()).unwrap();
    let canvas = BubbleCanvas::new(160, 240);
    let _follow = canvas.follow(engine.bus());

    let session = FrameCapture::start(
        Arc::new(canvas.clone()),
        options(10, 30),
        &DeviceProfile::unconstrained(),
    )
    .unwrap();
    let capture = tokio::spawn(capture_playback(
        session,
        engine.events(EventFilter::type_prefix("conversation")),
    ));

    engine.start().unwrap();
    let buffer = capture.await.unwrap();

    assert_eq!(buffer.stop_reason, StopReason::Requested);
    assert!(!buffer.is_empty());
    assert!(buffer.len() < 300);
    assert_eq!(canvas.bubble_count(), 3);
    assert_ne!(buffer.frames.first(), buffer.frames.last());
}

#[tokio::test(start_paused = true)]
async fn lost_surface_is_reported_by_the_exporter() {
    let surface = MockSurface::default();
    let session = FrameCapture::start(
        Arc::new(surface.clone()),
        options(10, 10),
        &DeviceProfile::unconstrained(),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(350)).await;
    surface.detach();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let buffer = session.stop().await;
    assert!(matches!(buffer.stop_reason, StopReason::SurfaceLost(_)));

    let mut job = GifExporter::new(4).export_buffer(buffer);
    let progress = job.progress().await;
    assert!(matches!(progress, Some(ExportProgress::Failed { .. })));
    let err = job.wait().await.unwrap_err();
    assert!(matches!(err, ExportError::Capture { .. }));
}

#[tokio::test(start_paused = true)]
async fn follow_stops_with_the_conversation() {
    let engine = TimelineEngine::new(simple_conversation(2), &fast_config()).unwrap();
    let session = FrameCapture::start(
        Arc::new(MockSurface::default()),
        options(10, 30),
        &DeviceProfile::unconstrained(),
    )
    .unwrap();
    let capture = session.follow(engine.bus());

    engine.start().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    engine.reset();

    let buffer = capture.await.unwrap();
    assert_eq!(buffer.stop_reason, StopReason::Requested);
    assert!(!buffer.is_empty());
}
