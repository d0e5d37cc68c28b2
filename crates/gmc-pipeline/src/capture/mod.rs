//! Camera capture and frame rendering (OpenCV).

mod overlay;

pub use overlay::{draw_landmarks, draw_overlay};

use opencv::core::{Mat, Vector};
use opencv::imgcodecs;
use opencv::prelude::{MatTraitConst, VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH};
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

/// Capture device settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConfig {
    pub device: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            width: 640,
            height: 480,
        }
    }
}

/// Webcam handle producing mirrored BGR frames.
pub struct Camera {
    cap: VideoCapture,
    config: CameraConfig,
}

impl Camera {
    /// Open the capture device. Fails with `CollaboratorUnavailable` when the
    /// device cannot be opened.
    pub fn open(config: CameraConfig) -> PipelineResult<Self> {
        let mut cap = VideoCapture::new(config.device, CAP_ANY).map_err(|e| {
            PipelineError::collaborator_unavailable(format!(
                "camera {} could not be opened: {e}",
                config.device
            ))
        })?;

        if !cap.is_opened().unwrap_or(false) {
            return Err(PipelineError::collaborator_unavailable(format!(
                "camera {} could not be opened",
                config.device
            )));
        }

        // Drivers may ignore the requested size; frames are used as delivered.
        let _ = cap.set(CAP_PROP_FRAME_WIDTH, config.width as f64);
        let _ = cap.set(CAP_PROP_FRAME_HEIGHT, config.height as f64);

        let actual_w = cap.get(CAP_PROP_FRAME_WIDTH).unwrap_or(config.width as f64);
        let actual_h = cap.get(CAP_PROP_FRAME_HEIGHT).unwrap_or(config.height as f64);
        info!(
            device = config.device,
            width = actual_w as u32,
            height = actual_h as u32,
            "Camera opened"
        );

        Ok(Self { cap, config })
    }

    pub fn config(&self) -> CameraConfig {
        self.config
    }

    /// Read the next frame, mirrored horizontally. `Ok(None)` when the
    /// device produced no frame.
    pub fn read(&mut self) -> PipelineResult<Option<Mat>> {
        let mut raw = Mat::default();
        let ok = self
            .cap
            .read(&mut raw)
            .map_err(|e| PipelineError::capture(format!("read failed: {e}")))?;
        if !ok || raw.empty() {
            debug!("Camera returned an empty frame");
            return Ok(None);
        }

        let mut mirrored = Mat::default();
        opencv::core::flip(&raw, &mut mirrored, 1)
            .map_err(|e| PipelineError::capture(format!("flip failed: {e}")))?;
        Ok(Some(mirrored))
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        let _ = self.cap.release();
    }
}

/// Encode a frame as JPEG with the given quality (0-100).
pub fn encode_jpeg(frame: &Mat, quality: u8) -> PipelineResult<Vec<u8>> {
    let params = Vector::<i32>::from_slice(&[
        imgcodecs::IMWRITE_JPEG_QUALITY,
        i32::from(quality.min(100)),
    ]);
    let mut buf = Vector::<u8>::new();
    let ok = imgcodecs::imencode(".jpg", frame, &mut buf, &params)
        .map_err(|e| PipelineError::capture(format!("JPEG encode failed: {e}")))?;
    if !ok {
        return Err(PipelineError::capture("JPEG encode returned no data"));
    }
    Ok(buf.to_vec())
}
