//! MediaPipe hand landmark model on ONNX Runtime.
//!
//! Notes:
//! - The model takes NHWC `[1, 224, 224, 3]` RGB in `[0, 1]`.
//! - Outputs are 63 floats (21 × xyz in input pixels) and a hand presence
//!   score. Other outputs (handedness) are ignored.
//! - The whole frame is fed to the model; there is no palm-detection stage,
//!   so the hand should fill a good part of the image.

use std::path::{Path, PathBuf};

use gmc_models::{Landmark, LANDMARK_COUNT};
use opencv::core::{Mat, Size};
use opencv::imgproc;
use opencv::prelude::{MatTraitConst, MatTraitConstManual};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};
use crate::source::LandmarkSource;

const INPUT_SIZE: i32 = 224;

/// Presence scores below this mean "no hand".
pub const PRESENCE_THRESHOLD: f32 = 0.5;

/// ONNX Runtime hand landmarker.
pub struct OrtHandLandmarker {
    session: Session,
    output_names: Vec<String>,
}

impl OrtHandLandmarker {
    /// Load from an explicit path, or search the default locations.
    pub fn load_or_default(model_path: Option<&Path>) -> PipelineResult<Self> {
        match model_path {
            Some(path) => Self::load(path),
            None => {
                let path = find_default_model_path().ok_or_else(|| {
                    PipelineError::collaborator_unavailable(
                        "hand_landmark.onnx not found; set GMC_MODEL_PATH or place it under models/",
                    )
                })?;
                Self::load(&path)
            }
        }
    }

    pub fn load(model_path: &Path) -> PipelineResult<Self> {
        if !model_path.exists() {
            return Err(PipelineError::collaborator_unavailable(format!(
                "hand landmark model not found at {}",
                model_path.display()
            )));
        }

        let model_bytes = std::fs::read(model_path).map_err(|e| {
            PipelineError::collaborator_unavailable(format!("ORT read model file: {e}"))
        })?;

        let session = Session::builder()
            .map_err(|e| PipelineError::collaborator_unavailable(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| PipelineError::collaborator_unavailable(format!("ORT opt level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| PipelineError::collaborator_unavailable(format!("ORT load model: {e}")))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        info!(path = %model_path.display(), outputs = ?output_names, "Hand landmark model loaded");

        Ok(Self {
            session,
            output_names,
        })
    }
}

impl LandmarkSource for OrtHandLandmarker {
    type Frame = Mat;

    fn detect(&mut self, frame_bgr: &Mat) -> PipelineResult<Option<Vec<Landmark>>> {
        let tensor = mat_to_nhwc_tensor(frame_bgr)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| PipelineError::inference(format!("ORT run failed: {e}")))?;

        let mut coords: Option<Vec<f32>> = None;
        let mut presence: Option<f32> = None;
        for name in &self.output_names {
            let Some(value) = outputs.get(name.as_str()) else {
                continue;
            };
            let (_, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::inference(format!("ORT extract: {e}")))?;
            match data.len() {
                n if n == LANDMARK_COUNT * 3 && coords.is_none() => coords = Some(data.to_vec()),
                1 if presence.is_none() => presence = Some(data[0]),
                _ => {}
            }
        }

        let coords =
            coords.ok_or_else(|| PipelineError::inference("model returned no landmark output"))?;
        let presence = presence.unwrap_or(1.0);
        if presence < PRESENCE_THRESHOLD {
            debug!(presence, "No hand in frame");
            return Ok(None);
        }

        Ok(Some(normalize_landmarks(&coords)))
    }

    fn name(&self) -> &str {
        "ort-hand-landmark"
    }
}

/// Map model-pixel coordinates to normalized frame coordinates.
fn normalize_landmarks(coords: &[f32]) -> Vec<Landmark> {
    let size = INPUT_SIZE as f32;
    coords
        .chunks_exact(3)
        .map(|c| Landmark::new(c[0] / size, c[1] / size, c[2] / size))
        .collect()
}

/// Resize a BGR frame to 224×224 RGB and pack it as `[1, 224, 224, 3]` in `[0, 1]`.
fn mat_to_nhwc_tensor(frame_bgr: &Mat) -> PipelineResult<Value> {
    let mut resized = Mat::default();
    imgproc::resize(
        frame_bgr,
        &mut resized,
        Size::new(INPUT_SIZE, INPUT_SIZE),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )
    .map_err(|e| PipelineError::inference(format!("Resize failed: {e}")))?;

    let mut rgb = Mat::default();
    imgproc::cvt_color(
        &resized,
        &mut rgb,
        imgproc::COLOR_BGR2RGB,
        0,
        opencv::core::AlgorithmHint::ALGO_HINT_DEFAULT,
    )
    .map_err(|e| PipelineError::inference(format!("BGR2RGB failed: {e}")))?;

    if rgb.channels() != 3 {
        return Err(PipelineError::inference("Expected 3-channel frame"));
    }

    // Row padding would break the flat HWC view.
    let rgb = if rgb.is_continuous() {
        rgb
    } else {
        rgb.try_clone()
            .map_err(|e| PipelineError::inference(format!("Mat clone: {e}")))?
    };

    let data = rgb
        .data_typed::<u8>()
        .map_err(|e| PipelineError::inference(format!("Mat data: {e}")))?;

    let nhwc: Vec<f32> = data.iter().map(|v| *v as f32 / 255.0).collect();
    let shape = vec![1usize, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];
    Tensor::from_array((shape, nhwc.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| PipelineError::inference(format!("ORT tensor: {e}")))
}

fn find_default_model_path() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &[
        "./models/hand_landmark.onnx",
        "./models/hand_landmark/hand_landmark.onnx",
        "/app/models/hand_landmark.onnx",
    ];

    CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}
