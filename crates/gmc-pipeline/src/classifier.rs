//! Geometric pose classifier.
//!
//! A finger counts as open when its tip sits above its PIP joint in image
//! space (smaller `y`). Only ordinal comparisons are used, so the result is
//! invariant to where the hand is in the frame.
//!
//! Rules are a priority chain:
//!
//! | index | middle | ring | pinky | Gesture |
//! |-------|--------|------|-------|---------|
//! | open  | open   | open | open  | `PlayPause` |
//! | open  | closed | closed | any | `VolumeUp` |
//! | closed | closed | closed | any | `Mute` |
//! | otherwise | | | | `None` |

use gmc_models::landmark::{
    INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP,
};
use gmc_models::{Gesture, LandmarkSet};

/// Open/closed state of the four non-thumb fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerStates {
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    /// Number of extended fingers.
    pub fn open_count(&self) -> usize {
        [self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|open| **open)
            .count()
    }
}

#[inline]
fn is_open(landmarks: &LandmarkSet, tip: usize, pip: usize) -> bool {
    landmarks[tip].y < landmarks[pip].y
}

/// Compute which fingers are extended.
pub fn finger_states(landmarks: &LandmarkSet) -> FingerStates {
    FingerStates {
        index: is_open(landmarks, INDEX_TIP, INDEX_PIP),
        middle: is_open(landmarks, MIDDLE_TIP, MIDDLE_PIP),
        ring: is_open(landmarks, RING_TIP, RING_PIP),
        pinky: is_open(landmarks, PINKY_TIP, PINKY_PIP),
    }
}

/// Map a landmark set to a gesture. Pure and total.
pub fn classify(landmarks: &LandmarkSet) -> Gesture {
    classify_fingers(finger_states(landmarks))
}

/// Apply the rule chain to precomputed finger states.
pub fn classify_fingers(fingers: FingerStates) -> Gesture {
    let FingerStates {
        index,
        middle,
        ring,
        pinky,
    } = fingers;

    // Open palm first so a fully open hand never reads as a partial gesture.
    if index && middle && ring && pinky {
        return Gesture::PlayPause;
    }

    // Pinky is deliberately ignored by the last two rules.
    if index && !middle && !ring {
        return Gesture::VolumeUp;
    }

    if !index && !middle && !ring {
        return Gesture::Mute;
    }

    Gesture::None
}

/// Synthetic hand poses shared by unit and integration tests.
#[doc(hidden)]
pub mod fixtures {
    use gmc_models::landmark::{
        INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP,
    };
    use gmc_models::{Landmark, LandmarkSet, LANDMARK_COUNT};

    use super::FingerStates;

    /// Raw 21-point hand centered at `(cx, cy)` with the given fingers open.
    pub fn hand_points(fingers: FingerStates, cx: f32, cy: f32) -> Vec<Landmark> {
        let mut points = vec![Landmark::xy(cx, cy + 0.2); LANDMARK_COUNT];
        let pairs = [
            (INDEX_TIP, INDEX_PIP, fingers.index, -0.04),
            (MIDDLE_TIP, MIDDLE_PIP, fingers.middle, -0.01),
            (RING_TIP, RING_PIP, fingers.ring, 0.02),
            (PINKY_TIP, PINKY_PIP, fingers.pinky, 0.05),
        ];
        for (tip, pip, open, dx) in pairs {
            points[pip] = Landmark::xy(cx + dx, cy);
            let tip_y = if open { cy - 0.1 } else { cy + 0.05 };
            points[tip] = Landmark::xy(cx + dx, tip_y);
        }
        points
    }

    pub fn hand(fingers: FingerStates) -> LandmarkSet {
        LandmarkSet::new(&hand_points(fingers, 0.5, 0.5)).expect("fixture has 21 points")
    }

    pub fn open_palm() -> Vec<Landmark> {
        hand_points(
            FingerStates { index: true, middle: true, ring: true, pinky: true },
            0.5,
            0.5,
        )
    }

    pub fn fist() -> Vec<Landmark> {
        hand_points(FingerStates::default(), 0.5, 0.5)
    }

    pub fn index_up() -> Vec<Landmark> {
        hand_points(FingerStates { index: true, ..FingerStates::default() }, 0.5, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn fingers(index: bool, middle: bool, ring: bool, pinky: bool) -> FingerStates {
        FingerStates { index, middle, ring, pinky }
    }

    #[test]
    fn test_open_palm_is_play_pause() {
        let set = LandmarkSet::new(&open_palm()).unwrap();
        assert_eq!(classify(&set), Gesture::PlayPause);
        assert_eq!(finger_states(&set).open_count(), 4);
    }

    #[test]
    fn test_index_only_is_volume_up() {
        assert_eq!(classify(&hand(fingers(true, false, false, false))), Gesture::VolumeUp);
    }

    #[test]
    fn test_raised_pinky_does_not_block_volume_up() {
        assert_eq!(classify(&hand(fingers(true, false, false, true))), Gesture::VolumeUp);
    }

    #[test]
    fn test_fist_is_mute_regardless_of_pinky() {
        assert_eq!(classify(&hand(fingers(false, false, false, false))), Gesture::Mute);
        assert_eq!(classify(&hand(fingers(false, false, false, true))), Gesture::Mute);
    }

    #[test]
    fn test_partial_poses_are_none() {
        // Peace sign, three fingers, and middle-only are all unmapped.
        assert_eq!(classify(&hand(fingers(true, true, false, false))), Gesture::None);
        assert_eq!(classify(&hand(fingers(true, true, true, false))), Gesture::None);
        assert_eq!(classify(&hand(fingers(false, true, false, false))), Gesture::None);
    }

    #[test]
    fn test_exhaustive_rule_table() {
        for bits in 0u8..16 {
            let f = fingers(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            let expected = if f.index && f.middle && f.ring && f.pinky {
                Gesture::PlayPause
            } else if f.index && !f.middle && !f.ring {
                Gesture::VolumeUp
            } else if !f.index && !f.middle && !f.ring {
                Gesture::Mute
            } else {
                Gesture::None
            };
            assert_eq!(classify_fingers(f), expected, "fingers {:?}", f);
            assert_eq!(classify(&hand(f)), expected, "landmarks for {:?}", f);
        }
    }

    #[test]
    fn test_translation_invariance() {
        let palm = LandmarkSet::new(&open_palm()).unwrap();
        for (dx, dy) in [(-0.3, -0.3), (0.0, 0.25), (0.35, -0.1), (0.2, 0.2)] {
            assert_eq!(classify(&palm.translated(dx, dy)), Gesture::PlayPause);
        }
    }

    #[test]
    fn test_equal_heights_count_as_closed() {
        let mut points = open_palm();
        points[INDEX_TIP].y = points[INDEX_PIP].y;
        let set = LandmarkSet::new(&points).unwrap();
        assert!(!finger_states(&set).index);
        assert_eq!(classify(&set), Gesture::None);
    }
}
