//! Offline replay of landmark recordings.
//!
//! A recording is JSON lines, one frame per line:
//!
//! ```text
//! {"t_ms": 0, "landmarks": [{"x": 0.5, "y": 0.4}, ...]}
//! {"t_ms": 33, "landmarks": null}
//! ```
//!
//! `t_ms` is the frame time relative to the start of the recording. Blank
//! lines and lines starting with `#` are ignored.

use std::io::BufRead;
use std::path::Path;
use std::time::{Duration, Instant};

use gmc_models::{FrameMetrics, Gesture, Landmark};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dispatcher::KeyPresser;
use crate::error::{PipelineError, PipelineResult};
use crate::gate::GateDecision;
use crate::pipeline::FramePipeline;
use crate::source::{LandmarkSource, PrecomputedSource};

/// One recorded frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub t_ms: u64,
    #[serde(default)]
    pub landmarks: Option<Vec<Landmark>>,
}

/// Fire event produced while replaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FireEvent {
    pub t_ms: u64,
    pub gesture: Gesture,
}

/// Totals for a replay run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub frames: usize,
    pub skipped: usize,
    pub fires: Vec<FireEvent>,
    pub last: FrameMetrics,
}

/// Parse a recording from any buffered reader.
pub fn parse_recording<R: BufRead>(reader: R) -> PipelineResult<Vec<RecordedFrame>> {
    let mut frames = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let frame: RecordedFrame = serde_json::from_str(trimmed).map_err(|e| {
            PipelineError::config(format!("recording line {}: {e}", line_no + 1))
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Load a recording file.
pub fn load_recording(path: impl AsRef<Path>) -> PipelineResult<Vec<RecordedFrame>> {
    let file = std::fs::File::open(path.as_ref())?;
    let frames = parse_recording(std::io::BufReader::new(file))?;
    info!(path = %path.as_ref().display(), frames = frames.len(), "Loaded landmark recording");
    Ok(frames)
}

/// Drive `pipeline` through a recording, anchoring `t_ms = 0` at `base`.
///
/// Malformed frames are logged and skipped, like in a live loop.
pub fn replay<K: KeyPresser>(
    pipeline: &mut FramePipeline<K>,
    frames: &[RecordedFrame],
    base: Instant,
) -> ReplaySummary {
    let mut source = PrecomputedSource;
    let mut summary = ReplaySummary::default();

    for frame in frames {
        let now = base + Duration::from_millis(frame.t_ms);
        let landmarks = match source.detect(&frame.landmarks) {
            Ok(l) => l,
            Err(e) => {
                warn!(t_ms = frame.t_ms, error = %e, "Skipping frame");
                summary.skipped += 1;
                continue;
            }
        };

        match pipeline.step_detailed(landmarks.as_deref(), now) {
            Ok(outcome) => {
                summary.frames += 1;
                summary.last = outcome.metrics;
                if let GateDecision::Fired(gesture) = outcome.decision {
                    summary.fires.push(FireEvent {
                        t_ms: frame.t_ms,
                        gesture,
                    });
                }
            }
            Err(e) => {
                warn!(t_ms = frame.t_ms, error = %e, "Skipping malformed frame");
                summary.skipped += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::fixtures::{fist, open_palm};
    use crate::config::PipelineConfig;
    use crate::dispatcher::RecordingKeyPresser;
    use std::io::Write;

    fn line(t_ms: u64, landmarks: Option<Vec<Landmark>>) -> String {
        serde_json::to_string(&RecordedFrame { t_ms, landmarks }).unwrap()
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let text = format!(
            "# recorded at 30fps\n{}\n\n{}\n",
            line(0, None),
            line(33, Some(open_palm()))
        );
        let frames = parse_recording(text.as_bytes()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].landmarks.as_ref().map(Vec::len), Some(21));
    }

    #[test]
    fn test_parse_reports_line_number() {
        let text = format!("{}\n{{\"t_ms\": \"soon\"}}\n", line(0, None));
        let err = parse_recording(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn test_missing_landmarks_field_means_no_hand() {
        let frames = parse_recording(r#"{"t_ms": 5}"#.as_bytes()).unwrap();
        assert_eq!(frames[0].landmarks, None);
    }

    #[test]
    fn test_replay_reproduces_fire_events() {
        let mut frames: Vec<RecordedFrame> = (0..45)
            .map(|i| RecordedFrame { t_ms: i * 33, landmarks: Some(open_palm()) })
            .collect();
        frames.push(RecordedFrame { t_ms: 2100, landmarks: Some(fist()) });
        frames.push(RecordedFrame { t_ms: 2133, landmarks: Some(vec![Landmark::default(); 3]) });

        let mut pipeline =
            FramePipeline::with_presser(&PipelineConfig::default(), RecordingKeyPresser::default());
        let summary = replay(&mut pipeline, &frames, Instant::now());

        assert_eq!(summary.frames, 46);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            summary.fires,
            vec![
                FireEvent { t_ms: 0, gesture: Gesture::PlayPause },
                FireEvent { t_ms: 1023, gesture: Gesture::PlayPause },
                FireEvent { t_ms: 2100, gesture: Gesture::Mute },
            ]
        );
        assert_eq!(pipeline.presser().pressed.len(), 3);
    }

    #[test]
    fn test_load_recording_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", line(0, Some(fist()))).unwrap();
        writeln!(file, "{}", line(40, None)).unwrap();
        let frames = load_recording(file.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].t_ms, 40);
    }
}
