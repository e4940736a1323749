// Overlay synthesis: background-matched fill patches for text regions
//
// For each text sub-region, samples the border color on the original
// (uncropped) image, fills a canvas of exactly the region's size, and writes
// it through the sink as `{bubble_id}_overlay_{subregion_index}.png`.
// Filenames are unique per (bubble, subregion), so concurrent writes never
// collide.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::core::errors::{OverlayError, OverlayResult};
use crate::core::types::{OverlayPatch, Region};
use crate::utils::color::sample_border;
use crate::utils::image_ops::encode_png;

/// Destination for synthesized overlay images. The pipeline only needs
/// "write bytes under a name".
#[async_trait]
pub trait OverlaySink: Send + Sync {
    async fn write(&self, filename: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Directory-backed sink used in production.
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl OverlaySink for DirSink {
    async fn write(&self, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(filename), bytes).await
    }
}

/// In-memory sink for tests.
#[cfg(test)]
pub struct MemorySink {
    pub files: parking_lot::Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self {
            files: parking_lot::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl OverlaySink for MemorySink {
    async fn write(&self, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
        self.files.lock().insert(filename.to_string(), bytes.to_vec());
        Ok(())
    }
}

pub struct OverlaySynthesizer {
    sink: Arc<dyn OverlaySink>,
}

impl OverlaySynthesizer {
    pub fn new(sink: Arc<dyn OverlaySink>) -> Self {
        Self { sink }
    }

    /// Synthesize one solid-fill overlay for a sub-region.
    ///
    /// `image` is the original uncropped page; the bubble crop may not extend
    /// far enough past the region to sample a clean border. Non-positive
    /// dimensions fail only this sub-region.
    pub async fn synthesize(
        &self,
        image: &RgbaImage,
        region: Region,
        bubble_id: usize,
        subregion_index: usize,
    ) -> OverlayResult<OverlayPatch> {
        let width = region.width();
        let height = region.height();
        if width <= 0 || height <= 0 {
            return Err(OverlayError::InvalidRegion { width, height });
        }

        let fill = sample_border(image, region);
        let canvas = RgbaImage::from_pixel(width as u32, height as u32, fill);
        let bytes = encode_png(&DynamicImage::ImageRgba8(canvas))?;

        let filename = format!("{bubble_id}_overlay_{subregion_index}.png");
        self.sink.write(&filename, &bytes).await?;

        debug!(
            filename = %filename,
            fill = ?fill.0,
            "Synthesized {}x{} overlay",
            width,
            height
        );
        Ok(OverlayPatch { filename, region })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn synthesizer() -> (OverlaySynthesizer, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (OverlaySynthesizer::new(sink.clone()), sink)
    }

    fn page(color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(200, 200, color)
    }

    #[tokio::test]
    async fn overlay_has_exactly_the_region_dimensions() {
        let (synth, sink) = synthesizer();
        let patch = synth
            .synthesize(&page(Rgba([255, 255, 255, 255])), Region::new(10, 10, 30, 50), 0, 0)
            .await
            .unwrap();

        let files = sink.files.lock();
        let written = image::load_from_memory(&files[&patch.filename]).unwrap();
        assert_eq!((written.width(), written.height()), (20, 40));
    }

    #[tokio::test]
    async fn overlay_is_filled_with_the_border_color() {
        let (synth, sink) = synthesizer();
        let background = Rgba([40, 90, 160, 255]);
        let patch = synth
            .synthesize(&page(background), Region::new(50, 50, 70, 70), 2, 1)
            .await
            .unwrap();

        let files = sink.files.lock();
        let written = image::load_from_memory(&files[&patch.filename])
            .unwrap()
            .to_rgba8();
        assert_eq!(*written.get_pixel(5, 5), background);
    }

    #[tokio::test]
    async fn filename_encodes_bubble_and_subregion() {
        let (synth, _sink) = synthesizer();
        let patch = synth
            .synthesize(&page(Rgba([0, 0, 0, 255])), Region::new(0, 0, 10, 10), 3, 1)
            .await
            .unwrap();
        assert_eq!(patch.filename, "3_overlay_1.png");
    }

    #[tokio::test]
    async fn non_positive_dimensions_are_rejected() {
        let (synth, sink) = synthesizer();
        let result = synth
            .synthesize(&page(Rgba([0, 0, 0, 255])), Region::new(30, 10, 30, 50), 0, 0)
            .await;
        assert!(matches!(
            result,
            Err(OverlayError::InvalidRegion { width: 0, height: 40 })
        ));
        assert!(sink.files.lock().is_empty());
    }
}
