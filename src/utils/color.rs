// Border color sampling for seamless overlay patches

use crate::core::types::Region;
use image::{Rgba, RgbaImage};

/// Fallback when clamping leaves no ring to sample (box at the very edge of a
/// tiny image). Deterministic mid-gray, fully opaque.
const FALLBACK: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// Average color of the one-pixel ring immediately outside `region`.
///
/// The box is clamped so the ring stays inside the image: `x1' = max(1, x1)`,
/// `y1' = max(1, y1)`, `x2' = min(width-2, x2)`, `y2' = min(height-2, y2)`.
/// The ring is the row above and the row below the box across columns
/// `[x1'-1, x2'+1]`, plus the column left and right of the box across rows
/// `[y1', y2']`. Channels are averaged independently and rounded to nearest;
/// the result is always fully opaque.
pub fn sample_border(image: &RgbaImage, region: Region) -> Rgba<u8> {
    let width = image.width() as i32;
    let height = image.height() as i32;

    let x1 = region.x1.max(1);
    let y1 = region.y1.max(1);
    let x2 = region.x2.min(width - 2);
    let y2 = region.y2.min(height - 2);

    // Clamping can invert the box when it sits at the edge of an image too
    // small to hold a ring; fall back rather than fail.
    if x1 > x2 || y1 > y2 {
        return FALLBACK;
    }

    let mut sum = [0u64; 3];
    let mut count = 0u64;

    let mut add = |x: i32, y: i32| {
        let pixel = image.get_pixel(x as u32, y as u32);
        sum[0] += pixel[0] as u64;
        sum[1] += pixel[1] as u64;
        sum[2] += pixel[2] as u64;
        count += 1;
    };

    for x in (x1 - 1)..=(x2 + 1) {
        add(x, y1 - 1);
        add(x, y2 + 1);
    }

    for y in y1..=y2 {
        add(x1 - 1, y);
        add(x2 + 1, y);
    }

    if count == 0 {
        return FALLBACK;
    }

    let average = |channel: u64| ((channel as f64 / count as f64).round()) as u8;
    Rgba([average(sum[0]), average(sum[1]), average(sum[2]), 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Uniform background with a differently colored interior box.
    fn framed_image(background: Rgba<u8>, interior: Rgba<u8>, region: Region) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(100, 100, background);
        for y in region.y1..region.y2 {
            for x in region.x1..region.x2 {
                image.put_pixel(x as u32, y as u32, interior);
            }
        }
        image
    }

    #[test]
    fn uniform_background_is_returned_exactly() {
        let background = Rgba([200, 120, 40, 255]);
        let region = Region::new(20, 20, 60, 50);
        let image = framed_image(background, Rgba([0, 0, 0, 255]), region);
        assert_eq!(sample_border(&image, region), background);
    }

    #[test]
    fn interior_content_does_not_affect_the_sample() {
        let background = Rgba([255, 255, 255, 255]);
        let region = Region::new(10, 10, 30, 50);
        let noisy = framed_image(background, Rgba([13, 200, 77, 255]), region);
        assert_eq!(sample_border(&noisy, region), background);
    }

    #[test]
    fn box_touching_the_edge_is_clamped() {
        let background = Rgba([50, 60, 70, 255]);
        let image = RgbaImage::from_pixel(100, 100, background);
        // x1 = 0 clamps to 1; must not index out of bounds.
        assert_eq!(sample_border(&image, Region::new(0, 0, 40, 40)), background);
        assert_eq!(
            sample_border(&image, Region::new(60, 60, 120, 120)),
            background
        );
    }

    #[test]
    fn degenerate_ring_falls_back_to_mid_gray() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
        assert_eq!(
            sample_border(&image, Region::new(0, 0, 2, 2)),
            Rgba([128, 128, 128, 255])
        );
    }

    #[test]
    fn average_is_rounded_to_nearest() {
        // Two-tone ring: half 100, half 101 per channel averages to 100.5.
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([100, 100, 100, 255]));
        for x in 0..10 {
            for y in 0..5 {
                image.put_pixel(x, y, Rgba([101, 101, 101, 255]));
            }
        }
        let sampled = sample_border(&image, Region::new(3, 3, 6, 6));
        assert!(sampled[0] == 100 || sampled[0] == 101);
        assert_eq!(sampled[3], 255);
    }
}
