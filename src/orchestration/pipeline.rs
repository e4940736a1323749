// Pipeline orchestrator: concurrent per-bubble extraction with fault isolation
//
// One task per detected bubble, bounded by a semaphore, awaited as a batch.
// Results land in pre-sized index slots so the caller-visible order is the
// original detection order, never task completion order. A failing task is
// logged and its bubble dropped; it never cancels or blocks siblings.

use std::sync::Arc;

use futures::future::join_all;
use image::DynamicImage;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::core::config::Config;
use crate::core::errors::ExtractionError;
use crate::core::types::{Bubble, BubbleEntry, Detection};
use crate::services::extraction::RegionExtractor;

pub struct PipelineOrchestrator {
    confidence_threshold: f32,
    extractor: Arc<RegionExtractor>,
    extraction_semaphore: Arc<Semaphore>,
}

impl PipelineOrchestrator {
    pub fn new(config: &Config, extractor: Arc<RegionExtractor>) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold(),
            extractor,
            extraction_semaphore: Arc::new(Semaphore::new(config.max_concurrent_extractions())),
        }
    }

    /// Crop every detection and run extraction on each crop concurrently.
    ///
    /// Bubbles whose extraction fails or finds no text are omitted from the
    /// output; surviving entries are in original detection index order.
    #[instrument(skip(self, image, detections), fields(detections = detections.len()))]
    pub async fn process(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
    ) -> Vec<BubbleEntry> {
        let mut tasks = Vec::new();

        for (index, detection) in detections.iter().enumerate() {
            if detection.confidence < self.confidence_threshold {
                debug!(
                    bubble = index,
                    confidence = detection.confidence,
                    "Skipping low-confidence detection"
                );
                continue;
            }

            let Some(bubble) = Bubble::from_detection(index, detection, image) else {
                warn!(bubble = index, "Detection box has no area inside the image");
                continue;
            };

            let extractor = Arc::clone(&self.extractor);
            let semaphore = Arc::clone(&self.extraction_semaphore);

            tasks.push(tokio::spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (bubble.index, Err(ExtractionError::Unavailable)),
                };
                let result = extractor.extract(&bubble.image, bubble.origin).await;
                drop(permit);
                (bubble.index, result)
            }));
        }

        // Await everything regardless of individual failures; each outcome is
        // written into its own index slot.
        let mut slots: Vec<Option<BubbleEntry>> = Vec::new();
        slots.resize_with(detections.len(), || None);

        for joined in join_all(tasks).await {
            match joined {
                Ok((index, Ok(subregions))) => {
                    if subregions.is_empty() {
                        debug!(bubble = index, "No text found, dropping bubble");
                    } else {
                        slots[index] = Some(BubbleEntry { index, subregions });
                    }
                }
                Ok((index, Err(err))) => {
                    warn!(bubble = index, error = %err, "Extraction failed, dropping bubble");
                }
                Err(join_err) => {
                    warn!(error = %join_err, "Extraction task panicked, dropping bubble");
                }
            }
        }

        let entries: Vec<BubbleEntry> = slots.into_iter().flatten().collect();
        info!(
            "Extraction finished: {} of {} bubbles carry text",
            entries.len(),
            detections.len()
        );
        entries
    }
}
