//! Landmark dots and the metrics dashboard drawn onto frames.

use gmc_models::{FrameMetrics, Landmark};
use opencv::core::{Mat, Point, Rect, Scalar};
use opencv::imgproc;
use opencv::prelude::MatTraitConst;

use crate::error::{PipelineError, PipelineResult};

fn draw_err(e: opencv::Error) -> PipelineError {
    PipelineError::capture(format!("overlay drawing failed: {e}"))
}

/// Draw each landmark as a small white dot. Coordinates are normalized.
pub fn draw_landmarks(frame: &mut Mat, landmarks: &[Landmark]) -> PipelineResult<()> {
    let (w, h) = (frame.cols() as f32, frame.rows() as f32);
    let white = Scalar::new(255.0, 255.0, 255.0, 0.0);
    for lm in landmarks {
        let center = Point::new((lm.x * w) as i32, (lm.y * h) as i32);
        imgproc::circle(frame, center, 2, white, imgproc::FILLED, imgproc::LINE_8, 0)
            .map_err(draw_err)?;
    }
    Ok(())
}

/// Draw the FPS / latency / gesture panel in the top-left corner.
pub fn draw_overlay(frame: &mut Mat, metrics: &FrameMetrics) -> PipelineResult<()> {
    let panel = Scalar::new(40.0, 40.0, 40.0, 0.0);
    imgproc::rectangle(
        frame,
        Rect::new(5, 5, 215, 105),
        panel,
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )
    .map_err(draw_err)?;

    // BGR
    let lines = [
        (format!("FPS: {}", metrics.fps as u32), Scalar::new(255.0, 255.0, 255.0, 0.0)),
        (format!("Latency: {}ms", metrics.latency_ms), Scalar::new(0.0, 255.0, 255.0, 0.0)),
        (format!("Gesture: {}", metrics.gesture), Scalar::new(0.0, 255.0, 0.0, 0.0)),
    ];

    for (i, (text, color)) in lines.iter().enumerate() {
        imgproc::put_text(
            frame,
            text,
            Point::new(15, 30 + 30 * i as i32),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.6,
            *color,
            2,
            imgproc::LINE_AA,
            false,
        )
        .map_err(draw_err)?;
    }
    Ok(())
}
