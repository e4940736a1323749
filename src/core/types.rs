// Core data model for the bubble processing pipeline

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// One candidate bubble region reported by the external detector.
///
/// Coordinates are in source-image pixels, with `(x_center, y_center)` at the
/// box center. Immutable once read from the detector response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

/// An axis-aligned box `(x1, y1)`–`(x2, y2)` in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Region {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Shift the region by an offset, e.g. crop-local to image-global.
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// Axis-aligned enclosing box of a vertex set (min/max over x and y).
    ///
    /// Returns `None` for an empty vertex list.
    pub fn enclosing(vertices: &[(i32, i32)]) -> Option<Self> {
        let (first, rest) = vertices.split_first()?;
        let mut region = Self::new(first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            region.x1 = region.x1.min(x);
            region.y1 = region.y1.min(y);
            region.x2 = region.x2.max(x);
            region.y2 = region.y2.max(y);
        }
        Some(region)
    }
}

/// A cropped sub-image plus its global offset, derived from one Detection.
///
/// `index` is the position of the originating Detection in the input list and
/// is the sole correlation key carried through concurrent processing.
pub struct Bubble {
    pub index: usize,
    pub origin: (i32, i32),
    pub image: DynamicImage,
}

impl Bubble {
    /// Crop a bubble out of the source image.
    ///
    /// The corners are integer-truncated from the detection's center/size and
    /// clamped to the image bounds; the clamped top-left becomes the origin so
    /// crop-local coordinates translate back correctly. Returns `None` when
    /// the clamped box has no area.
    pub fn from_detection(index: usize, detection: &Detection, image: &DynamicImage) -> Option<Self> {
        let x1 = (detection.x_center - detection.width / 2.0) as i32;
        let y1 = (detection.y_center - detection.height / 2.0) as i32;
        let x2 = (detection.x_center + detection.width / 2.0) as i32;
        let y2 = (detection.y_center + detection.height / 2.0) as i32;

        let x1 = x1.max(0);
        let y1 = y1.max(0);
        let x2 = x2.min(image.width() as i32);
        let y2 = y2.min(image.height() as i32);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let cropped = image.crop_imm(
            x1 as u32,
            y1 as u32,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
        );

        Some(Self {
            index,
            origin: (x1, y1),
            image: cropped,
        })
    }
}

/// One text-bearing region found inside a bubble, in global coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubRegion {
    pub region: Region,
    pub text: String,
    pub locale: String,
}

/// Orchestrator output for one bubble that yielded text.
#[derive(Debug, Clone)]
pub struct BubbleEntry {
    pub index: usize,
    pub subregions: Vec<SubRegion>,
}

/// Overlay synthesis output: the written filename and the region it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPatch {
    pub filename: String,
    pub region: Region,
}

/// Final record for one sub-region: geometry, recognized text, and the
/// synthesized overlay to draw replacement text onto.
#[derive(Debug, Clone, Serialize)]
pub struct TextPatch {
    pub region: Region,
    pub text: String,
    pub locale: String,
    pub overlay_filename: String,
}

/// Final result for one bubble, index-aligned with the input detections.
#[derive(Debug, Clone, Serialize)]
pub struct BubbleResult {
    pub index: usize,
    pub patches: Vec<TextPatch>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn enclosing_box_reduces_polygon() {
        let vertices = [(10, 40), (30, 5), (20, 25)];
        let region = Region::enclosing(&vertices).unwrap();
        assert_eq!(region, Region::new(10, 5, 30, 40));
    }

    #[test]
    fn enclosing_box_of_empty_polygon_is_none() {
        assert!(Region::enclosing(&[]).is_none());
    }

    #[test]
    fn translate_shifts_all_corners() {
        let region = Region::new(5, 5, 25, 15).translate(100, 50);
        assert_eq!(region, Region::new(105, 55, 125, 65));
    }

    #[test]
    fn bubble_crop_is_clamped_to_image() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(100, 80));
        let detection = Detection {
            x_center: 0.0,
            y_center: 0.0,
            width: 40.0,
            height: 40.0,
            confidence: 0.9,
        };
        let bubble = Bubble::from_detection(0, &detection, &image).unwrap();
        assert_eq!(bubble.origin, (0, 0));
        assert_eq!(bubble.image.width(), 20);
        assert_eq!(bubble.image.height(), 20);
    }

    #[test]
    fn bubble_outside_image_is_rejected() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(100, 80));
        let detection = Detection {
            x_center: 500.0,
            y_center: 500.0,
            width: 20.0,
            height: 20.0,
            confidence: 0.9,
        };
        assert!(Bubble::from_detection(0, &detection, &image).is_none());
    }
}
