// Region extractor: recognition plus coordinate-system translation
//
// Sits between the orchestrator and the recognition adapter. Encodes the
// bubble crop, reduces each recognized polygon to its axis-aligned enclosing
// box, and translates crop-local coordinates to image-global ones by adding
// the bubble's origin.

use std::sync::Arc;

use image::DynamicImage;
use tracing::debug;

use crate::core::errors::{ExtractionError, ExtractionResult};
use crate::core::types::{Region, SubRegion};
use crate::services::recognition::Recognizer;
use crate::utils::image_ops::encode_png;

pub struct RegionExtractor {
    recognizer: Arc<dyn Recognizer>,
}

impl RegionExtractor {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self { recognizer }
    }

    /// Extract text sub-regions from one bubble crop.
    ///
    /// Returns an empty vec when the recognizer finds no text; transport and
    /// response failures surface as errors for the orchestrator to isolate.
    pub async fn extract(
        &self,
        cropped: &DynamicImage,
        origin: (i32, i32),
    ) -> ExtractionResult<Vec<SubRegion>> {
        let png = encode_png(cropped).map_err(ExtractionError::Encode)?;
        let recognized = self.recognizer.recognize(&png).await?;

        let mut subregions = Vec::with_capacity(recognized.len());
        for region in recognized {
            // Vertex presence is validated at the adapter boundary, so the
            // enclosing box always exists here.
            let local = Region::enclosing(&region.vertices).ok_or_else(|| {
                ExtractionError::MalformedResponse("region with no vertices".to_string())
            })?;
            subregions.push(SubRegion {
                region: local.translate(origin.0, origin.1),
                text: region.text,
                locale: region.locale,
            });
        }

        debug!(
            origin = ?origin,
            count = subregions.len(),
            "Extraction finished for crop"
        );
        Ok(subregions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::recognition::RecognizedRegion;
    use async_trait::async_trait;
    use image::RgbaImage;

    struct FixedRecognizer(ExtractionResult<Vec<RecognizedRegion>>);

    #[async_trait]
    impl Recognizer for FixedRecognizer {
        async fn recognize(&self, _image_png: &[u8]) -> ExtractionResult<Vec<RecognizedRegion>> {
            match &self.0 {
                Ok(regions) => Ok(regions.clone()),
                Err(_) => Err(ExtractionError::Timeout),
            }
        }
    }

    fn crop() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::new(40, 30))
    }

    #[tokio::test]
    async fn local_boxes_are_translated_to_global_coordinates() {
        let recognizer = FixedRecognizer(Ok(vec![RecognizedRegion {
            vertices: vec![(5, 5), (25, 15)],
            text: "hello".to_string(),
            locale: "en".to_string(),
        }]));
        let extractor = RegionExtractor::new(Arc::new(recognizer));

        let subregions = extractor.extract(&crop(), (100, 50)).await.unwrap();
        assert_eq!(subregions.len(), 1);
        assert_eq!(subregions[0].region, Region::new(105, 55, 125, 65));
        assert_eq!(subregions[0].text, "hello");
        assert_eq!(subregions[0].locale, "en");
    }

    #[tokio::test]
    async fn arbitrary_polygon_is_reduced_to_enclosing_box() {
        let recognizer = FixedRecognizer(Ok(vec![RecognizedRegion {
            vertices: vec![(10, 2), (3, 8), (14, 11), (7, 1)],
            text: "poly".to_string(),
            locale: "ja".to_string(),
        }]));
        let extractor = RegionExtractor::new(Arc::new(recognizer));

        let subregions = extractor.extract(&crop(), (0, 0)).await.unwrap();
        assert_eq!(subregions[0].region, Region::new(3, 1, 14, 11));
    }

    #[tokio::test]
    async fn no_text_yields_empty_list() {
        let extractor = RegionExtractor::new(Arc::new(FixedRecognizer(Ok(vec![]))));
        let subregions = extractor.extract(&crop(), (10, 10)).await.unwrap();
        assert!(subregions.is_empty());
    }

    #[tokio::test]
    async fn recognizer_failure_is_surfaced_not_masked() {
        let extractor =
            RegionExtractor::new(Arc::new(FixedRecognizer(Err(ExtractionError::Timeout))));
        let result = extractor.extract(&crop(), (0, 0)).await;
        assert!(matches!(result, Err(ExtractionError::Timeout)));
    }
}
