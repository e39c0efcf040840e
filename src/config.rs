use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::size_index::SizeIndexBounds;
use crate::video::SyntheticConfig;

const DEFAULT_INPUT_URI: &str = "stub://flock";
const DEFAULT_OUTPUT_PATH: &str = "output/output_video.mp4";
const DEFAULT_UPLOAD_PATH: &str = "input/upload_video.mp4";
const DEFAULT_UPLOAD_OUTPUT_PATH: &str = "output/upload_processed.mp4";
const DEFAULT_REPORT_PATH: &str = "output/report.csv";
const DEFAULT_API_ADDR: &str = "127.0.0.1:8798";
const DEFAULT_DETECTOR_BACKEND: &str = "synthetic";
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_IOU: f32 = 0.30;
const DEFAULT_DEVICE: &str = "cpu";
// COCO class id for birds.
const DEFAULT_TARGET_CLASS: u32 = 14;
const DEFAULT_SAMPLE_FPS: u32 = 5;

#[derive(Debug, Deserialize, Default)]
struct FlockConfigFile {
    input: Option<String>,
    output: Option<String>,
    report_path: Option<String>,
    upload: Option<UploadConfigFile>,
    api: Option<ApiConfigFile>,
    detector: Option<DetectorConfigFile>,
    sampling: Option<SamplingConfigFile>,
    size_index: Option<SizeIndexConfigFile>,
    annotate: Option<AnnotateConfigFile>,
    stub: Option<StubConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct UploadConfigFile {
    path: Option<String>,
    output: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfigFile {
    addr: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    confidence: Option<f32>,
    iou: Option<f32>,
    persist: Option<bool>,
    device: Option<String>,
    target_class: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct SamplingConfigFile {
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct SizeIndexConfigFile {
    min_area: Option<f64>,
    max_area: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct AnnotateConfigFile {
    font_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct StubConfigFile {
    frames: Option<u64>,
    frame_rate: Option<f64>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Full runtime configuration for the daemon and the one-shot CLI.
#[derive(Debug, Clone)]
pub struct FlockConfig {
    /// Default input processed by `/process-video`.
    pub input_uri: String,
    /// Annotated video written by default runs.
    pub output_path: String,
    /// Where `/analyze-video` stores the uploaded bytes.
    pub upload_path: String,
    /// Annotated video written for uploaded runs.
    pub upload_output_path: String,
    /// Per-bird CSV report served by `/download-csv`.
    pub report_path: String,
    pub api_addr: String,
    pub detector: DetectorSettings,
    pub sampling: SamplingSettings,
    pub size_index: SizeIndexBounds,
    pub annotate: AnnotateSettings,
    pub stub_source: SyntheticConfig,
}

/// Configuration surface of the detection/tracking collaborator.
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub confidence: f32,
    pub iou: f32,
    /// Keep temporal association state across frames of one run.
    pub persist: bool,
    pub device: String,
    pub target_class: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            backend: DEFAULT_DETECTOR_BACKEND.to_string(),
            confidence: DEFAULT_CONFIDENCE,
            iou: DEFAULT_IOU,
            persist: true,
            device: DEFAULT_DEVICE.to_string(),
            target_class: DEFAULT_TARGET_CLASS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SamplingSettings {
    /// Sampled frames per second of source time.
    pub target_fps: u32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_SAMPLE_FPS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnotateSettings {
    pub font_path: Option<PathBuf>,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self::from_file(FlockConfigFile::default())
    }
}

impl FlockConfig {
    /// Load configuration: optional JSON file named by `FLOCK_CONFIG`, then
    /// env overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FLOCK_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: FlockConfigFile) -> Self {
        let detector_file = file.detector.unwrap_or_default();
        let detector_defaults = DetectorSettings::default();
        let detector = DetectorSettings {
            backend: detector_file.backend.unwrap_or(detector_defaults.backend),
            confidence: detector_file
                .confidence
                .unwrap_or(detector_defaults.confidence),
            iou: detector_file.iou.unwrap_or(detector_defaults.iou),
            persist: detector_file.persist.unwrap_or(detector_defaults.persist),
            device: detector_file.device.unwrap_or(detector_defaults.device),
            target_class: detector_file
                .target_class
                .unwrap_or(detector_defaults.target_class),
        };

        let bounds_file = file.size_index.unwrap_or_default();
        let bounds_defaults = SizeIndexBounds::default();
        let size_index = SizeIndexBounds {
            min_area: bounds_file.min_area.unwrap_or(bounds_defaults.min_area),
            max_area: bounds_file.max_area.unwrap_or(bounds_defaults.max_area),
        };

        let stub_file = file.stub.unwrap_or_default();
        let stub_defaults = SyntheticConfig::default();
        let stub_source = SyntheticConfig {
            frames: stub_file.frames.unwrap_or(stub_defaults.frames),
            frame_rate: stub_file.frame_rate.unwrap_or(stub_defaults.frame_rate),
            width: stub_file.width.unwrap_or(stub_defaults.width),
            height: stub_file.height.unwrap_or(stub_defaults.height),
        };

        let upload = file.upload.unwrap_or_default();

        Self {
            input_uri: file.input.unwrap_or_else(|| DEFAULT_INPUT_URI.to_string()),
            output_path: file
                .output
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            upload_path: upload
                .path
                .unwrap_or_else(|| DEFAULT_UPLOAD_PATH.to_string()),
            upload_output_path: upload
                .output
                .unwrap_or_else(|| DEFAULT_UPLOAD_OUTPUT_PATH.to_string()),
            report_path: file
                .report_path
                .unwrap_or_else(|| DEFAULT_REPORT_PATH.to_string()),
            api_addr: file
                .api
                .and_then(|api| api.addr)
                .unwrap_or_else(|| DEFAULT_API_ADDR.to_string()),
            detector,
            sampling: SamplingSettings {
                target_fps: file
                    .sampling
                    .and_then(|sampling| sampling.target_fps)
                    .unwrap_or(DEFAULT_SAMPLE_FPS),
            },
            size_index,
            annotate: AnnotateSettings {
                font_path: file.annotate.and_then(|annotate| annotate.font_path),
            },
            stub_source,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(input) = std::env::var("FLOCK_INPUT") {
            if !input.trim().is_empty() {
                self.input_uri = input;
            }
        }
        if let Ok(output) = std::env::var("FLOCK_OUTPUT") {
            if !output.trim().is_empty() {
                self.output_path = output;
            }
        }
        if let Ok(addr) = std::env::var("FLOCK_API_ADDR") {
            if !addr.trim().is_empty() {
                self.api_addr = addr;
            }
        }
        if let Ok(backend) = std::env::var("FLOCK_DETECTOR_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend;
            }
        }
        if let Ok(fps) = std::env::var("FLOCK_SAMPLE_FPS") {
            let fps: u32 = fps
                .parse()
                .map_err(|_| anyhow!("FLOCK_SAMPLE_FPS must be an integer frame rate"))?;
            self.sampling.target_fps = fps;
        }
        if let Ok(path) = std::env::var("FLOCK_FONT_PATH") {
            if !path.trim().is_empty() {
                self.annotate.font_path = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    /// Reject configurations the pipeline is not defined for.
    pub fn validate(&self) -> Result<()> {
        if self.size_index.min_area >= self.size_index.max_area {
            return Err(anyhow!(
                "size_index.min_area ({}) must be less than max_area ({})",
                self.size_index.min_area,
                self.size_index.max_area
            ));
        }
        if self.sampling.target_fps == 0 {
            return Err(anyhow!("sampling.target_fps must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.detector.confidence) {
            return Err(anyhow!("detector.confidence must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.detector.iou) {
            return Err(anyhow!("detector.iou must be within [0, 1]"));
        }
        if self.input_uri.trim().is_empty() {
            return Err(anyhow!("input must not be empty"));
        }
        if self.stub_source.frames == 0 || self.stub_source.frame_rate <= 0.0 {
            return Err(anyhow!("stub source needs at least one frame and a positive rate"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<FlockConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
