//! Built-in sessions for tests and demos.

use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::session::{BoundingBox, Detection, DetectorSession};
use crate::frame::Frame;

/// Scripted session. Yields the next scripted detection list on each call
/// and empty results once the script is exhausted.
pub struct StubSession {
    script: VecDeque<Vec<Detection>>,
}

impl StubSession {
    /// A session that never detects anything.
    pub fn empty() -> Self {
        Self {
            script: VecDeque::new(),
        }
    }

    /// Feed back one scripted detection list per processed frame.
    pub fn with_script(frames: Vec<Vec<Detection>>) -> Self {
        Self {
            script: frames.into(),
        }
    }
}

impl DetectorSession for StubSession {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn process(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

/// Deterministic wandering flock for demos.
///
/// Emits `flock_size` tracked birds with stable sparse raw ids and box
/// areas that sweep the default size-index window, plus an untracked bird
/// every fourth call and a non-bird detection every fifth, so class
/// filtering and the untracked-count path stay exercised.
pub struct SyntheticSession {
    flock_size: u32,
    target_class: u32,
    calls: u64,
}

impl SyntheticSession {
    pub fn new(flock_size: u32, target_class: u32) -> Self {
        Self {
            flock_size,
            target_class,
            calls: 0,
        }
    }
}

impl DetectorSession for SyntheticSession {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn process(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let call = self.calls;
        self.calls += 1;

        let width = frame.width() as f32;
        let height = frame.height() as f32;
        let mut detections = Vec::new();

        for bird in 0..u64::from(self.flock_size) {
            // Side length sweeps ~45..150 px so areas cross the whole
            // normalization window over a run.
            let phase = (call * 9 + bird * 31) % 120;
            let sweep = if phase < 60 { phase } else { 120 - phase } as f32;
            let side = (45.0 + sweep * 1.75).min(width - 2.0).min(height - 2.0);

            let span_x = (width - side - 2.0).max(1.0) as u64;
            let span_y = (height - side - 2.0).max(1.0) as u64;
            let x1 = ((call * 5 + bird * 83) % span_x) as f32;
            let y1 = ((call * 3 + bird * 59) % span_y) as f32;

            detections.push(Detection {
                class_id: self.target_class,
                confidence: 0.9 - bird as f32 * 0.02,
                bbox: BoundingBox {
                    x1,
                    y1,
                    x2: x1 + side,
                    y2: y1 + side,
                },
                track_id: Some(101 + bird as i64 * 7),
            });
        }

        if call % 4 == 3 {
            detections.push(Detection {
                class_id: self.target_class,
                confidence: 0.41,
                bbox: BoundingBox {
                    x1: 4.0,
                    y1: 4.0,
                    x2: 36.0,
                    y2: 36.0,
                },
                track_id: None,
            });
        }

        if call % 5 == 4 {
            detections.push(Detection {
                class_id: self.target_class + 1,
                confidence: 0.77,
                bbox: BoundingBox {
                    x1: width - 40.0,
                    y1: height - 40.0,
                    x2: width - 8.0,
                    y2: height - 8.0,
                },
                track_id: Some(9000),
            });
        }

        Ok(detections)
    }
}
