//! Frame overlays.
//!
//! Each surviving detection gets a hollow box, an `ID:` label above it and a
//! `W:` size-index label below it; every sampled frame carries a running
//! `Count:` banner. Boxes are always drawn. Labels need a TrueType font;
//! when none can be loaded the annotator warns once and keeps drawing boxes
//! only.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::detect::BoundingBox;
use crate::frame::Frame;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const ID_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const INDEX_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const COUNT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const LABEL_SCALE: f32 = 18.0;
const COUNT_SCALE: f32 = 30.0;

/// Candidate fonts tried in order when no explicit path is configured.
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = load_font(font_path);
        if font.is_none() {
            log::warn!("no label font available; frames will carry boxes without text");
        }
        Self { font }
    }

    /// Box plus id and size-index labels for one detection.
    pub fn draw_detection(
        &self,
        frame: &mut Frame,
        bbox: &BoundingBox,
        bird_id: u32,
        size_index: f64,
    ) {
        let (width, height) = (frame.width(), frame.height());
        let image = frame.image_mut();

        if let Some(rect) = clamp_rect(bbox, width, height) {
            draw_hollow_rect_mut(image, rect, BOX_COLOR);
            if let Some(inner) = shrink(rect) {
                draw_hollow_rect_mut(image, inner, BOX_COLOR);
            }
        }

        if let Some(font) = &self.font {
            let scale = PxScale::from(LABEL_SCALE);
            let x = bbox.x1.max(0.0) as i32;
            let id_y = (bbox.y1 as i32 - LABEL_SCALE as i32 - 2).max(0);
            draw_text_mut(image, ID_COLOR, x, id_y, scale, font, &format!("ID:{bird_id}"));
            let index_y = (bbox.y2 as i32 + 2).min(height as i32 - LABEL_SCALE as i32);
            draw_text_mut(
                image,
                INDEX_COLOR,
                x,
                index_y.max(0),
                scale,
                font,
                &format!("W:{size_index}"),
            );
        }
    }

    /// Running per-frame bird count banner.
    pub fn draw_frame_count(&self, frame: &mut Frame, count: u32) {
        if let Some(font) = &self.font {
            draw_text_mut(
                frame.image_mut(),
                COUNT_COLOR,
                30,
                40,
                PxScale::from(COUNT_SCALE),
                font,
                &format!("Count:{count}"),
            );
        }
    }
}

fn load_font(explicit: Option<&Path>) -> Option<FontVec> {
    let candidates: Vec<&Path> = match explicit {
        Some(path) => vec![path],
        None => FALLBACK_FONTS.iter().map(Path::new).collect(),
    };
    for path in candidates {
        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                log::debug!("label font: {}", path.display());
                return Some(font);
            }
            Err(err) => log::warn!("font '{}' unusable: {}", path.display(), err),
        }
    }
    None
}

fn clamp_rect(bbox: &BoundingBox, width: u32, height: u32) -> Option<Rect> {
    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;
    let x1 = bbox.x1.clamp(0.0, max_x) as i32;
    let y1 = bbox.y1.clamp(0.0, max_y) as i32;
    let x2 = bbox.x2.clamp(0.0, max_x) as i32;
    let y2 = bbox.y2.clamp(0.0, max_y) as i32;
    let w = (x2 - x1).max(0) as u32;
    let h = (y2 - y1).max(0) as u32;
    if w == 0 || h == 0 {
        return None;
    }
    Some(Rect::at(x1, y1).of_size(w, h))
}

fn shrink(rect: Rect) -> Option<Rect> {
    if rect.width() <= 2 || rect.height() <= 2 {
        return None;
    }
    Some(Rect::at(rect.left() + 1, rect.top() + 1).of_size(rect.width() - 2, rect.height() - 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxes_are_drawn_without_a_font() {
        let annotator = Annotator {
            font: None,
        };
        let mut frame = Frame::from_raw(vec![0u8; 64 * 64 * 3], 64, 64).expect("frame buffer");
        let bbox = BoundingBox {
            x1: 10.0,
            y1: 10.0,
            x2: 30.0,
            y2: 30.0,
        };
        annotator.draw_detection(&mut frame, &bbox, 1, 0.5);
        assert_eq!(*frame.image().get_pixel(10, 10), Rgb([0, 255, 0]));
        assert_eq!(*frame.image().get_pixel(29, 29), Rgb([0, 255, 0]));
        assert_eq!(*frame.image().get_pixel(50, 50), Rgb([0, 0, 0]));
    }

    #[test]
    fn off_frame_boxes_are_clamped_not_panicked() {
        let annotator = Annotator {
            font: None,
        };
        let mut frame = Frame::from_raw(vec![0u8; 32 * 32 * 3], 32, 32).expect("frame buffer");
        let bbox = BoundingBox {
            x1: -20.0,
            y1: -5.0,
            x2: 300.0,
            y2: 300.0,
        };
        annotator.draw_detection(&mut frame, &bbox, 2, 1.0);
        assert_eq!(*frame.image().get_pixel(0, 0), Rgb([0, 255, 0]));
    }

    #[test]
    fn degenerate_boxes_draw_nothing() {
        let bbox = BoundingBox {
            x1: 5.0,
            y1: 5.0,
            x2: 5.0,
            y2: 9.0,
        };
        assert!(clamp_rect(&bbox, 32, 32).is_none());
    }
}
