//! Hand landmarks in normalized image coordinates.
//!
//! # Layout (21-point hand model)
//!
//! - 0: Wrist
//! - 1-4: Thumb (CMC, MCP, IP, tip)
//! - 5-8: Index finger (MCP, PIP, DIP, tip)
//! - 9-12: Middle finger
//! - 13-16: Ring finger
//! - 17-20: Pinky
//!
//! `y` grows downwards, so a fingertip "above" its PIP joint has the smaller `y`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of keypoints in a hand landmark set.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// Single hand keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth; 0.0 for 2D sources.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// 2D landmark with zero depth.
    pub fn xy(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Errors raised when a landmark source hands back a malformed set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    #[error("Expected {expected} hand landmarks, got {actual}")]
    WrongCount { expected: usize, actual: usize },

    #[error("Landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

/// Validated set of exactly 21 hand landmarks.
///
/// Only constructible through validation, so indexing any of the 21 named
/// keypoints can never go out of range.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Validate and wrap a slice of landmarks.
    pub fn new(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let points: [Landmark; LANDMARK_COUNT] =
            points.try_into().map_err(|_| LandmarkError::WrongCount {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            })?;

        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }

        Ok(Self { points })
    }

    /// Keypoint by index. Panics only for indices >= 21.
    pub fn get(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.points.iter()
    }

    /// Copy of this set shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let mut points = self.points;
        for p in points.iter_mut() {
            p.x += dx;
            p.y += dy;
        }
        Self { points }
    }
}

impl std::ops::Index<usize> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl TryFrom<&[Landmark]> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: &[Landmark]) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        Self::new(&points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<Landmark> {
        (0..n).map(|i| Landmark::xy(0.01 * i as f32, 0.5)).collect()
    }

    #[test]
    fn test_accepts_exactly_21_points() {
        let set = LandmarkSet::new(&points(21)).unwrap();
        assert_eq!(set.iter().count(), LANDMARK_COUNT);
        assert!((set[INDEX_TIP].x - 0.08).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_wrong_count() {
        assert_eq!(
            LandmarkSet::new(&points(5)).unwrap_err(),
            LandmarkError::WrongCount { expected: 21, actual: 5 }
        );
        assert!(LandmarkSet::new(&points(0)).is_err());
        assert!(LandmarkSet::new(&points(22)).is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut pts = points(21);
        pts[12].y = f32::NAN;
        assert_eq!(
            LandmarkSet::new(&pts).unwrap_err(),
            LandmarkError::NonFinite { index: 12 }
        );
    }

    #[test]
    fn test_translated_shifts_every_point() {
        let set = LandmarkSet::new(&points(21)).unwrap();
        let moved = set.translated(0.1, -0.2);
        for (a, b) in set.iter().zip(moved.iter()) {
            assert!((b.x - a.x - 0.1).abs() < 1e-6);
            assert!((b.y - a.y + 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_depth_defaults_to_zero() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.25,"y":0.75}"#).unwrap();
        assert_eq!(lm, Landmark::new(0.25, 0.75, 0.0));
    }
}
