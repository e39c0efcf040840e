//! Decoded video frames.

use image::RgbImage;

/// One decoded frame, tightly packed RGB24.
///
/// Sources produce frames, the pipeline annotates them in place, sinks
/// consume them.
#[derive(Clone)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Build a frame from raw RGB24 bytes. Returns `None` when the buffer
    /// length does not match `width * height * 3`.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        RgbImage::from_vec(width, height, data).map(|image| Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGB24 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }
}
