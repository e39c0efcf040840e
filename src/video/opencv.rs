//! OpenCV-backed video file source and sink.

use anyhow::{anyhow, Context, Result};
use opencv::core::{self, Mat, Size};
use opencv::prelude::*;
use opencv::{imgproc, videoio};

use super::{FrameSink, FrameSource};
use crate::frame::Frame;

pub struct OpenCvSource {
    capture: videoio::VideoCapture,
    frame_rate: f64,
    width: u32,
    height: u32,
}

impl OpenCvSource {
    pub fn open(path: &str) -> Result<Self> {
        let capture = videoio::VideoCapture::from_file(path, videoio::CAP_ANY)
            .with_context(|| format!("open capture for '{path}'"))?;
        if !capture.is_opened()? {
            return Err(anyhow!("capture did not open '{path}'"));
        }
        let frame_rate = capture.get(videoio::CAP_PROP_FPS)?;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        log::info!("video source: {path} ({width}x{height} @ {frame_rate:.2} fps)");
        Ok(Self {
            capture,
            frame_rate,
            width,
            height,
        })
    }
}

impl FrameSource for OpenCvSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut bgr = Mat::default();
        if !self.capture.read(&mut bgr)? || bgr.empty() {
            return Ok(None);
        }
        let mut rgb = Mat::default();
        imgproc::cvt_color(
            &bgr,
            &mut rgb,
            imgproc::COLOR_BGR2RGB,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;
        let data = rgb.data_bytes()?.to_vec();
        Frame::from_raw(data, self.width, self.height)
            .ok_or_else(|| anyhow!("decoded frame size mismatch"))
            .map(Some)
    }
}

pub struct OpenCvSink {
    writer: videoio::VideoWriter,
    height: i32,
}

impl OpenCvSink {
    pub fn create(path: &str, frame_rate: f64, dimensions: (u32, u32)) -> Result<Self> {
        let (width, height) = dimensions;
        let fourcc = videoio::VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = videoio::VideoWriter::new(
            path,
            fourcc,
            frame_rate,
            Size::new(width as i32, height as i32),
            true,
        )
        .with_context(|| format!("create writer for '{path}'"))?;
        if !writer.is_opened()? {
            return Err(anyhow!("writer did not open '{path}'"));
        }
        log::info!("video sink: {path} ({width}x{height} @ {frame_rate:.2} fps)");
        Ok(Self {
            writer,
            height: height as i32,
        })
    }
}

impl FrameSink for OpenCvSink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        let flat = Mat::from_slice(frame.data())?;
        let rgb = flat.reshape(3, self.height)?;
        let mut bgr = Mat::default();
        imgproc::cvt_color(
            &rgb,
            &mut bgr,
            imgproc::COLOR_RGB2BGR,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;
        self.writer.write(&bgr)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }
}
