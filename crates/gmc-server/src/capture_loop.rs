//! Camera capture loop feeding the dashboard.
//!
//! Runs on a dedicated OS thread: OpenCV capture and ONNX inference block,
//! and the key presser is not `Send`. The thread owns the camera, the
//! landmarker and the [`FramePipeline`], and publishes into the shared
//! state through a [`StatusPublisher`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use gmc_pipeline::{
    draw_landmarks, draw_overlay, encode_jpeg, Camera, CameraConfig, FramePipeline, FrameTiming,
    KeyPresser, LandmarkSource, LoggingKeyPresser, PipelineConfig, PipelineResult,
};
use opencv::core::Mat;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::frame_loop::{detect_or_skip, next_frame, ReadRetry};
use crate::metrics;
use crate::state::StatusPublisher;

/// Frames between periodic progress logs.
const LOG_EVERY_FRAMES: u64 = 300;

/// Landmark source over camera frames.
pub type FrameLandmarker = Box<dyn LandmarkSource<Frame = Mat>>;

/// Load the hand landmarker configured for this build.
#[cfg(feature = "onnx")]
pub fn load_landmarker(config: &PipelineConfig) -> PipelineResult<FrameLandmarker> {
    let landmarker = gmc_pipeline::OrtHandLandmarker::load_or_default(config.model_path.as_deref())?;
    Ok(Box::new(landmarker))
}

/// Load the hand landmarker configured for this build.
#[cfg(not(feature = "onnx"))]
pub fn load_landmarker(_config: &PipelineConfig) -> PipelineResult<FrameLandmarker> {
    Err(gmc_pipeline::PipelineError::collaborator_unavailable(
        "hand landmark model support not compiled in (enable the `onnx` feature)",
    ))
}

/// Build the frame pipeline, falling back to dry-run key presses when the
/// configured presser cannot be created.
pub fn build_pipeline(
    config: &PipelineConfig,
    publisher: &mut StatusPublisher,
) -> FramePipeline {
    match FramePipeline::from_config(config) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Key presser unavailable, falling back to dry-run");
            publisher.fail(e.to_string());
            let presser: Box<dyn KeyPresser> = Box::new(LoggingKeyPresser);
            FramePipeline::with_presser(config, presser)
        }
    }
}

/// Handle to the running capture thread.
pub struct CaptureHandle {
    shutdown: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl CaptureHandle {
    /// Ask the loop to stop and wait for it to release the camera.
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if self.thread.join().is_err() {
            error!("Capture thread panicked");
        }
    }
}

/// Spawn the capture loop.
pub fn spawn_capture_loop(
    server: &ServerConfig,
    pipeline_config: PipelineConfig,
    publisher: StatusPublisher,
) -> std::io::Result<CaptureHandle> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let camera_config = CameraConfig {
        device: server.camera_device,
        width: server.camera_width,
        height: server.camera_height,
    };
    let jpeg_quality = server.jpeg_quality;
    let retry = server.read_retry();

    let flag = Arc::clone(&shutdown);
    let thread = std::thread::Builder::new()
        .name("gmc-capture".to_string())
        .spawn(move || {
            run_capture_loop(camera_config, jpeg_quality, retry, pipeline_config, publisher, &flag)
        })?;

    Ok(CaptureHandle { shutdown, thread })
}

fn run_capture_loop(
    camera_config: CameraConfig,
    jpeg_quality: u8,
    mut retry: ReadRetry,
    pipeline_config: PipelineConfig,
    mut publisher: StatusPublisher,
    shutdown: &AtomicBool,
) {
    let mut camera = match Camera::open(camera_config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Camera unavailable");
            publisher.fail(e.to_string());
            return;
        }
    };

    // Without a landmarker frames still stream, every one classified NONE.
    let mut landmarker = match load_landmarker(&pipeline_config) {
        Ok(l) => {
            info!(source = l.name(), "Hand landmarker ready");
            Some(l)
        }
        Err(e) => {
            error!(error = %e, "Hand landmarker unavailable");
            publisher.fail(e.to_string());
            None
        }
    };

    let mut pipeline = build_pipeline(&pipeline_config, &mut publisher);
    let mut processed = 0u64;

    info!("Capture loop started");

    loop {
        let Some(mut frame) = next_frame(|| camera.read(), &mut retry, shutdown) else {
            break;
        };
        let started_at = Instant::now();

        let Some(landmarks) = detect_or_skip(landmarker.as_deref_mut(), &frame) else {
            continue;
        };
        let timing = FrameTiming::new(started_at, Instant::now());

        let frame_metrics = match pipeline.step(landmarks.as_deref(), timing) {
            Ok(m) => m,
            Err(e) => {
                metrics::record_capture_error("classify");
                warn!(error = %e, "Frame rejected");
                continue;
            }
        };
        publisher.publish_metrics(&frame_metrics);

        if let Some(points) = landmarks.as_deref() {
            if let Err(e) = draw_landmarks(&mut frame, points) {
                debug!(error = %e, "Landmark drawing failed");
            }
        }
        if let Err(e) = draw_overlay(&mut frame, &frame_metrics) {
            debug!(error = %e, "Overlay drawing failed");
        }
        match encode_jpeg(&frame, jpeg_quality) {
            Ok(jpeg) => publisher.publish_frame(jpeg),
            Err(e) => {
                metrics::record_capture_error("encode");
                debug!(error = %e, "Frame encoding failed");
            }
        }

        processed += 1;
        if processed % LOG_EVERY_FRAMES == 0 {
            info!(
                frames = processed,
                fps = frame_metrics.fps as u32,
                viewers = publisher.viewer_count(),
                "Capture progress"
            );
        }
    }

    if retry.is_failing() && !shutdown.load(Ordering::Relaxed) {
        error!(device = camera_config.device, "Camera stopped producing frames");
        publisher.fail(format!("camera {} stopped producing frames", camera_config.device));
    }
    info!(frames = processed, "Capture loop stopped");
}
