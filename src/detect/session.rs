//! Detection/tracking collaborator boundary.
//!
//! The model that detects birds and associates them across frames is an
//! external collaborator. One `DetectorSession` is opened per run; it owns
//! whatever temporal-association state the model keeps, and must be fed
//! every processed frame in original order, never concurrently or out of
//! order.

use anyhow::Result;

use crate::frame::Frame;

/// Axis-aligned box in pixel coordinates, `x2 >= x1`, `y2 >= y1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        f64::from(self.x2 - self.x1) * f64::from(self.y2 - self.y1)
    }
}

/// One detection reported by the collaborator for one frame.
#[derive(Clone, Debug)]
pub struct Detection {
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// Raw tracking id. `None` when the tracker could not associate the
    /// detection with a prior one.
    pub track_id: Option<i64>,
}

/// Stateful per-run detection/tracking session.
pub trait DetectorSession {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection and tracking on the next processed frame.
    ///
    /// The session applies its configured confidence and overlap thresholds
    /// itself; callers receive already-thresholded detections.
    fn process(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}
