//! Bounding-box size index.
//!
//! Maps a detection's pixel area onto a clamped, linearly normalized scalar
//! in [0, 1]. The index is a relative size proxy for comparing birds within
//! one video. It carries no physical calibration and is not a mass estimate.

/// Area window for the normalization, in squared pixels.
///
/// Callers must keep `min_area < max_area`; configuration validation enforces
/// this before a pipeline is built.
#[derive(Clone, Copy, Debug)]
pub struct SizeIndexBounds {
    pub min_area: f64,
    pub max_area: f64,
}

impl Default for SizeIndexBounds {
    fn default() -> Self {
        Self {
            min_area: 2000.0,
            max_area: 22000.0,
        }
    }
}

/// Normalize a bounding-box area into [0, 1].
///
/// Areas below `min_area` map to 0.0, above `max_area` to 1.0, and the
/// window in between linearly. The result is rounded to three decimal
/// digits.
pub fn size_index(area: f64, bounds: SizeIndexBounds) -> f64 {
    if area < bounds.min_area {
        return 0.0;
    }
    if area > bounds.max_area {
        return 1.0;
    }
    round3((area - bounds.min_area) / (bounds.max_area - bounds.min_area))
}

/// Round to three decimal digits.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
