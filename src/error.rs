use thiserror::Error;

/// Failure taxonomy for one pipeline run.
///
/// A failed run produces no result: there is no partial-output or retry
/// policy for mid-run failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The video source could not be opened. Fatal before any run state
    /// exists.
    #[error("cannot open video source '{uri}': {reason}")]
    SourceUnavailable { uri: String, reason: String },

    /// The annotated-output sink could not be opened.
    #[error("cannot open video sink '{path}': {reason}")]
    SinkUnavailable { path: String, reason: String },

    /// The configured detector backend could not be opened.
    #[error("cannot open detector backend: {0}")]
    DetectorUnavailable(anyhow::Error),

    /// Rejected at the boundary before the pipeline is invoked.
    #[error("unsupported media type '{0}'")]
    UnsupportedMedia(String),

    /// The detection collaborator failed mid-run.
    #[error("detection failed on frame {frame}: {cause}")]
    Detection { frame: u64, cause: anyhow::Error },

    /// Frame decode or sink write failed mid-run.
    #[error("video i/o failed on frame {frame}: {cause}")]
    FrameIo { frame: u64, cause: anyhow::Error },
}
