//! Synthetic source and non-encoding sinks.

use anyhow::{anyhow, Result};

use super::{FrameSink, FrameSource};
use crate::frame::Frame;

/// Shape of the bounded synthetic source behind `stub://` URIs.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub frames: u64,
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            frames: 60,
            frame_rate: 30.0,
            width: 640,
            height: 480,
        }
    }
}

/// Bounded deterministic frame generator for `stub://` URIs.
pub struct SyntheticSource {
    config: SyntheticConfig,
    produced: u64,
}

impl SyntheticSource {
    pub fn new(uri: &str, config: SyntheticConfig) -> Self {
        log::info!(
            "video source: {} (synthetic, {} frames @ {} fps)",
            uri,
            config.frames,
            config.frame_rate
        );
        Self {
            config,
            produced: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn frame_rate(&self) -> f64 {
        self.config.frame_rate
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.produced >= self.config.frames {
            return Ok(None);
        }
        let (width, height) = (self.config.width, self.config.height);
        let shade = (self.produced % 32) as u8;
        let mut data = vec![0u8; (width * height * 3) as usize];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = ((i % 3) as u8) * 40 + shade;
        }
        self.produced += 1;
        Frame::from_raw(data, width, height)
            .ok_or_else(|| anyhow!("synthetic frame buffer mismatch"))
            .map(Some)
    }
}

/// Collects annotated frames in memory. Test sink.
#[derive(Default)]
pub struct MemorySink {
    frames: Vec<Frame>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for MemorySink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Discards frames, keeping only a count.
#[derive(Default)]
pub struct NullSink {
    written: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for NullSink {
    fn write(&mut self, _frame: &Frame) -> Result<()> {
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
