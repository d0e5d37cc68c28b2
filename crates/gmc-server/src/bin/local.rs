//! Local preview: camera window with landmark and metrics overlay.
//!
//! Press `q` (or Esc) in the window to quit.

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::Context;
use gmc_pipeline::{draw_landmarks, draw_overlay, Camera, CameraConfig, FrameTiming, PipelineConfig};
use opencv::highgui;
use tracing::{info, warn};

use gmc_server::capture_loop::{build_pipeline, load_landmarker};
use gmc_server::frame_loop::{detect_or_skip, next_frame};
use gmc_server::{logging, AppState, ServerConfig};

const WINDOW: &str = "Gesture Media Control";

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let server = ServerConfig::from_env();
    let mut retry = server.read_retry();
    let config = PipelineConfig::from_env()?;

    let mut camera = Camera::open(CameraConfig {
        device: server.camera_device,
        width: server.camera_width,
        height: server.camera_height,
    })?;

    let mut landmarker = load_landmarker(&config).context("hand landmarker unavailable")?;
    let (_state, mut publisher) = AppState::new(server);
    let mut pipeline = build_pipeline(&config, &mut publisher);
    if let Some(e) = publisher.error() {
        warn!("{e}");
    }

    highgui::named_window(WINDOW, highgui::WINDOW_AUTOSIZE)?;
    info!("Press q to quit");

    let shutdown = AtomicBool::new(false);

    loop {
        let Some(mut frame) = next_frame(|| camera.read(), &mut retry, &shutdown) else {
            warn!("Camera stopped producing frames");
            break;
        };
        let started_at = Instant::now();

        // A failed detection shows the raw frame without stepping the pipeline.
        if let Some(landmarks) = detect_or_skip(Some(&mut *landmarker), &frame) {
            let timing = FrameTiming::new(started_at, Instant::now());
            match pipeline.step(landmarks.as_deref(), timing) {
                Ok(metrics) => {
                    if let Some(points) = landmarks.as_deref() {
                        draw_landmarks(&mut frame, points)?;
                    }
                    draw_overlay(&mut frame, &metrics)?;
                }
                Err(e) => warn!(error = %e, "Frame rejected"),
            }
        }

        highgui::imshow(WINDOW, &frame)?;
        let key = highgui::wait_key(1)?;
        if key == i32::from(b'q') || key == 27 {
            break;
        }
    }

    highgui::destroy_all_windows()?;
    Ok(())
}
