use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Encode an image to PNG bytes.
///
/// Synchronous; bubble crops are small enough that spawn_blocking overhead
/// is not worth it.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;
    Ok(png_bytes)
}

/// Asynchronously decode an image from bytes using spawn_blocking.
///
/// Image decoding is CPU-intensive, especially for large pages, and would
/// otherwise block the async runtime.
pub async fn load_image_from_memory_async(bytes: Vec<u8>) -> Result<DynamicImage> {
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes).context("Failed to decode image from memory")
    })
    .await
    .context("Failed to spawn blocking task for image decoding")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_png_round_trips() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 4, Rgba([255, 0, 0, 255])));
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[tokio::test]
    async fn load_image_async_decodes_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([0, 255, 0, 255])));
        let bytes = encode_png(&img).unwrap();
        let decoded = load_image_from_memory_async(bytes).await.unwrap();
        assert_eq!(decoded.width(), 3);
    }
}
