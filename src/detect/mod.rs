//! Detection/tracking collaborators.
//!
//! The detection model is a black box behind [`DetectorSession`]. This crate
//! ships a scripted stub and a deterministic synthetic flock; real model
//! backends implement the trait and are selected here by name.

mod session;
mod stub;

pub use session::{BoundingBox, Detection, DetectorSession};
pub use stub::{StubSession, SyntheticSession};

use anyhow::{bail, Result};

use crate::config::DetectorSettings;

/// Flock size of the built-in synthetic session.
const SYNTHETIC_FLOCK_SIZE: u32 = 3;

/// Open a per-run session for the configured backend.
pub fn open_session(settings: &DetectorSettings) -> Result<Box<dyn DetectorSession>> {
    let session: Box<dyn DetectorSession> = match settings.backend.as_str() {
        "stub" => Box::new(StubSession::empty()),
        "synthetic" => Box::new(SyntheticSession::new(
            SYNTHETIC_FLOCK_SIZE,
            settings.target_class,
        )),
        other => bail!("unknown detector backend '{}'", other),
    };
    log::info!(
        "detector session '{}' (conf {:.2}, iou {:.2}, persist {}, device {})",
        session.name(),
        settings.confidence,
        settings.iou,
        settings.persist,
        settings.device
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_is_rejected() {
        let mut settings = DetectorSettings::default();
        settings.backend = "yolo26-quantum".to_string();
        assert!(open_session(&settings).is_err());
    }

    #[test]
    fn built_in_backends_open() {
        let mut settings = DetectorSettings::default();
        settings.backend = "stub".to_string();
        assert_eq!(open_session(&settings).unwrap().name(), "stub");
        settings.backend = "synthetic".to_string();
        assert_eq!(open_session(&settings).unwrap().name(), "synthetic");
    }
}
