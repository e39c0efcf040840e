//! The frame-sampling run driver.
//!
//! One `Pipeline` value is one run. It owns the identity map, the size-index
//! histories and the per-frame counts, pulls frames in original order,
//! samples them by stride, drives the detector session, annotates sampled
//! frames and writes them to the sink, then assembles the [`RunResult`].
//! `run` consumes the pipeline, so run state can never leak into a later
//! run. Everything happens on the caller's thread; the only cross-frame
//! state not owned here is the detector session's own association memory.

use std::collections::BTreeMap;

use crate::annotate::Annotator;
use crate::config::FlockConfig;
use crate::detect::{self, DetectorSession};
use crate::error::PipelineError;
use crate::frame::Frame;
use crate::metrics::SizeIndexAggregator;
use crate::size_index::{size_index, SizeIndexBounds};
use crate::track::IdentityMap;
use crate::video::{self, FrameSink, FrameSource};

/// Immutable outcome of one completed run.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// Class-filtered detection count per sampled original frame index.
    /// Zero-count frames are present; skipped frames are not.
    pub frame_counts: BTreeMap<u64, u32>,
    /// Dense bird ids in first-seen order.
    pub bird_ids: Vec<u32>,
    /// Mean size index per dense id, rounded to three decimal digits.
    pub mean_size_index: BTreeMap<u32, f64>,
}

/// Sampling stride: process every `floor(source_fps / target_fps)`-th frame,
/// clamped so every frame is processed when the source is slower than the
/// target.
pub fn sample_interval(source_fps: f64, target_fps: u32) -> u64 {
    if target_fps == 0 {
        return 1;
    }
    let interval = (source_fps / f64::from(target_fps)).floor();
    if interval < 1.0 {
        1
    } else {
        interval as u64
    }
}

pub struct Pipeline {
    target_class: u32,
    target_fps: u32,
    bounds: SizeIndexBounds,
    annotator: Annotator,
    identities: IdentityMap,
    sizes: SizeIndexAggregator,
    frame_counts: BTreeMap<u64, u32>,
}

impl Pipeline {
    pub fn new(cfg: &FlockConfig) -> Self {
        Self {
            target_class: cfg.detector.target_class,
            target_fps: cfg.sampling.target_fps,
            bounds: cfg.size_index,
            annotator: Annotator::new(cfg.annotate.font_path.as_deref()),
            identities: IdentityMap::new(),
            sizes: SizeIndexAggregator::new(),
            frame_counts: BTreeMap::new(),
        }
    }

    /// Drive one full run: pull every frame, process the sampled ones, then
    /// finalize. Sources and sinks close their handles on drop, so early
    /// failure releases them too.
    pub fn run(
        mut self,
        source: &mut dyn FrameSource,
        session: &mut dyn DetectorSession,
        sink: &mut dyn FrameSink,
    ) -> Result<RunResult, PipelineError> {
        let interval = sample_interval(source.frame_rate(), self.target_fps);
        log::info!(
            "sampling every {} frame(s) of a {:.2} fps source with detector '{}'",
            interval,
            source.frame_rate(),
            session.name()
        );

        let mut frame_index: u64 = 0;
        loop {
            let next = source
                .next_frame()
                .map_err(|cause| PipelineError::FrameIo {
                    frame: frame_index,
                    cause,
                })?;
            let Some(mut frame) = next else { break };

            if frame_index % interval == 0 {
                self.process_frame(frame_index, &mut frame, session)?;
                sink.write(&frame).map_err(|cause| PipelineError::FrameIo {
                    frame: frame_index,
                    cause,
                })?;
            }
            frame_index += 1;
        }

        sink.finish().map_err(|cause| PipelineError::FrameIo {
            frame: frame_index,
            cause,
        })?;

        log::info!(
            "run complete: {} frames read, {} sampled, {} birds",
            frame_index,
            self.frame_counts.len(),
            self.identities.len()
        );
        Ok(self.into_result())
    }

    fn process_frame(
        &mut self,
        frame_index: u64,
        frame: &mut Frame,
        session: &mut dyn DetectorSession,
    ) -> Result<(), PipelineError> {
        let detections = session
            .process(frame)
            .map_err(|cause| PipelineError::Detection {
                frame: frame_index,
                cause,
            })?;

        let mut count: u32 = 0;
        for detection in &detections {
            if detection.class_id != self.target_class {
                continue;
            }
            count += 1;

            // Untracked detections count toward the frame total but carry no
            // identity to aggregate under.
            let Some(raw_id) = detection.track_id else {
                continue;
            };
            let bird_id = self.identities.resolve(raw_id);
            let index = size_index(detection.bbox.area(), self.bounds);
            self.sizes.record(bird_id, index);
            self.annotator
                .draw_detection(frame, &detection.bbox, bird_id, index);
        }

        self.frame_counts.insert(frame_index, count);
        self.annotator.draw_frame_count(frame, count);
        Ok(())
    }

    fn into_result(self) -> RunResult {
        RunResult {
            frame_counts: self.frame_counts,
            bird_ids: self.sizes.tracked_ids(),
            mean_size_index: self.sizes.finalize(),
        }
    }
}

/// Open the source, the detector session and the sink for one run, drive the
/// pipeline and return its result.
pub fn process_video(
    cfg: &FlockConfig,
    input_uri: &str,
    output_path: &str,
) -> Result<RunResult, PipelineError> {
    let mut source = video::open_source(input_uri, &cfg.stub_source)?;
    let mut session =
        detect::open_session(&cfg.detector).map_err(PipelineError::DetectorUnavailable)?;
    let dimensions = source.dimensions();
    let mut sink = video::open_sink(
        output_path,
        f64::from(cfg.sampling.target_fps),
        dimensions,
    )?;
    Pipeline::new(cfg).run(source.as_mut(), session.as_mut(), sink.as_mut())
}
