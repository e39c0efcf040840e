//! flockwatch - poultry flock video analytics.
//!
//! The crate ingests a video stream, samples frames at a reduced rate, runs
//! each sampled frame through an external detection/tracking collaborator,
//! filters detections to birds, assigns stable per-bird identifiers, derives
//! a normalized size index per detection, aggregates it per bird across the
//! run, and emits an annotated video plus per-bird summary statistics
//! through a small HTTP boundary.
//!
//! # Module structure
//!
//! - `video`: frame source/sink collaborators (synthetic + OpenCV backends)
//! - `detect`: detection/tracking collaborator boundary and built-in sessions
//! - `pipeline`: the frame-sampling run driver and `RunResult`
//! - `track`, `metrics`, `size_index`: per-run state and the metric itself
//! - `annotate`: frame overlays
//! - `report`: summary shaping and the CSV report
//! - `api`: request/response boundary
//!
//! The size index is a relative, unitless proxy for bounding-box area in
//! [0, 1]. It is not a calibrated weight.

pub mod annotate;
pub mod api;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod size_index;
pub mod track;
pub mod ui;
pub mod video;

pub use config::{AnnotateSettings, DetectorSettings, FlockConfig, SamplingSettings};
pub use detect::{BoundingBox, Detection, DetectorSession, StubSession, SyntheticSession};
pub use error::PipelineError;
pub use frame::Frame;
pub use metrics::SizeIndexAggregator;
pub use pipeline::{process_video, sample_interval, Pipeline, RunResult};
pub use report::{summarize, write_csv_report, BirdDetail, VideoSummary};
pub use size_index::{size_index, SizeIndexBounds};
pub use track::IdentityMap;
pub use video::{
    FrameSink, FrameSource, MemorySink, NullSink, SyntheticConfig, SyntheticSource,
};
