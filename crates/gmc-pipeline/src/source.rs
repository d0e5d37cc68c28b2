//! Landmark source seam.

use gmc_models::Landmark;

use crate::error::PipelineResult;

/// Produces zero or one hand landmark set per frame.
///
/// Implementations may return any number of points; the pipeline validates
/// the count before classification.
pub trait LandmarkSource {
    type Frame;

    /// Detect a hand in `frame`. `Ok(None)` means no hand was found.
    fn detect(&mut self, frame: &Self::Frame) -> PipelineResult<Option<Vec<Landmark>>>;

    fn name(&self) -> &str;
}

/// Source whose frames already carry landmarks (recordings, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct PrecomputedSource;

impl LandmarkSource for PrecomputedSource {
    type Frame = Option<Vec<Landmark>>;

    fn detect(&mut self, frame: &Self::Frame) -> PipelineResult<Option<Vec<Landmark>>> {
        Ok(frame.clone())
    }

    fn name(&self) -> &str {
        "precomputed"
    }
}
