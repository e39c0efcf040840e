//! Video source and sink collaborators.
//!
//! Decode and encode are black boxes behind [`FrameSource`] and
//! [`FrameSink`]. `stub://` URIs resolve to a bounded synthetic source;
//! plain file paths require the `video-opencv` feature. Sources and sinks
//! release their underlying handles on drop, so every exit path from a run
//! closes them.

#[cfg(feature = "video-opencv")]
mod opencv;
mod stub;

#[cfg(feature = "video-opencv")]
pub use self::opencv::{OpenCvSink, OpenCvSource};
pub use stub::{MemorySink, NullSink, SyntheticConfig, SyntheticSource};

use anyhow::Result;

use crate::error::PipelineError;
use crate::frame::Frame;

/// Sequential frame reader. Frames arrive in strictly increasing original
/// index order; `None` marks source exhaustion.
pub trait FrameSource {
    fn frame_rate(&self) -> f64;
    fn dimensions(&self) -> (u32, u32);
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Sequential frame writer at a fixed output rate and size.
pub trait FrameSink {
    fn write(&mut self, frame: &Frame) -> Result<()>;
    /// Flush and close the underlying container.
    fn finish(&mut self) -> Result<()>;
}

/// Open a frame source for a URI.
pub fn open_source(
    uri: &str,
    stub: &SyntheticConfig,
) -> Result<Box<dyn FrameSource>, PipelineError> {
    if uri.trim().is_empty() {
        return Err(PipelineError::SourceUnavailable {
            uri: uri.to_string(),
            reason: "empty source uri".to_string(),
        });
    }
    if uri.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(uri, stub.clone())));
    }
    #[cfg(feature = "video-opencv")]
    {
        let source =
            OpenCvSource::open(uri).map_err(|err| PipelineError::SourceUnavailable {
                uri: uri.to_string(),
                reason: err.to_string(),
            })?;
        Ok(Box::new(source))
    }
    #[cfg(not(feature = "video-opencv"))]
    Err(PipelineError::SourceUnavailable {
        uri: uri.to_string(),
        reason: "file sources require the video-opencv feature".to_string(),
    })
}

/// Open the annotated-output sink. `null://` discards frames; without the
/// `video-opencv` feature file paths degrade to a discarding sink so
/// summary-only runs keep working.
pub fn open_sink(
    path: &str,
    frame_rate: f64,
    dimensions: (u32, u32),
) -> Result<Box<dyn FrameSink>, PipelineError> {
    if path.trim().is_empty() || path == "null://" {
        return Ok(Box::new(NullSink::new()));
    }
    #[cfg(feature = "video-opencv")]
    {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    PipelineError::SinkUnavailable {
                        path: path.to_string(),
                        reason: err.to_string(),
                    }
                })?;
            }
        }
        let sink = OpenCvSink::create(path, frame_rate, dimensions).map_err(|err| {
            PipelineError::SinkUnavailable {
                path: path.to_string(),
                reason: err.to_string(),
            }
        })?;
        Ok(Box::new(sink))
    }
    #[cfg(not(feature = "video-opencv"))]
    {
        let _ = (frame_rate, dimensions);
        log::warn!(
            "video sink '{}' needs the video-opencv feature; annotated frames will be discarded",
            path
        );
        Ok(Box::new(NullSink::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_uris_resolve_without_native_backends() {
        let source = open_source("stub://flock", &SyntheticConfig::default());
        assert!(source.is_ok());
    }

    #[test]
    fn empty_uri_is_source_unavailable() {
        let err = open_source("", &SyntheticConfig::default()).err().expect("must fail");
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    }

    #[test]
    fn null_sink_always_opens() {
        assert!(open_sink("null://", 5.0, (640, 480)).is_ok());
    }
}
