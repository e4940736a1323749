// Orchestration: full-run wiring of detector, extractor, and assembler

pub mod assembler;
pub mod pipeline;

pub use assembler::ResultAssembler;
pub use pipeline::PipelineOrchestrator;

use std::sync::Arc;

use tracing::{info, instrument};

use crate::core::config::Config;
use crate::core::errors::{PipelineError, PipelineResult};
use crate::core::types::BubbleResult;
use crate::services::detection::{Detector, HttpDetector};
use crate::services::extraction::RegionExtractor;
use crate::services::overlay::{DirSink, OverlaySink, OverlaySynthesizer};
use crate::services::recognition::{HttpRecognizer, Recognizer};

/// End-to-end bubble pipeline: detect, extract concurrently, assemble.
///
/// Capabilities are injected at construction; `new` wires the HTTP-backed
/// production adapters, `with_parts` accepts test doubles.
pub struct BubblePipeline {
    config: Arc<Config>,
    detector: Arc<dyn Detector>,
    orchestrator: PipelineOrchestrator,
    assembler: ResultAssembler,
}

impl BubblePipeline {
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let detector: Arc<dyn Detector> = Arc::new(HttpDetector::new(&config)?);
        let recognizer: Arc<dyn Recognizer> = Arc::new(HttpRecognizer::new(&config)?);
        let sink: Arc<dyn OverlaySink> = Arc::new(DirSink::new(config.overlay_dir()));
        Ok(Self::with_parts(config, detector, recognizer, sink))
    }

    pub fn with_parts(
        config: Arc<Config>,
        detector: Arc<dyn Detector>,
        recognizer: Arc<dyn Recognizer>,
        sink: Arc<dyn OverlaySink>,
    ) -> Self {
        let extractor = Arc::new(RegionExtractor::new(recognizer));
        let orchestrator = PipelineOrchestrator::new(&config, extractor);
        let assembler = ResultAssembler::new(OverlaySynthesizer::new(sink));
        Self {
            config,
            detector,
            orchestrator,
            assembler,
        }
    }

    /// Process one image end to end.
    ///
    /// Only detector failures (and an undecodable input image) are fatal;
    /// per-bubble and per-subregion conditions are reflected as omission in
    /// the returned list, which is index-ordered against the detections.
    #[instrument(skip(self, image_bytes), fields(bytes = image_bytes.len()))]
    pub async fn run(&self, image_bytes: Vec<u8>) -> PipelineResult<Vec<BubbleResult>> {
        let image = {
            let bytes = image_bytes.clone();
            tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
                .await
                .map_err(|e| PipelineError::Internal(e.to_string()))?
                .map_err(PipelineError::ImageLoad)?
        };

        let detections = self
            .detector
            .detect(
                &image_bytes,
                self.config.confidence_threshold(),
                self.config.overlap_threshold(),
            )
            .await?;
        info!("Detected {} candidate bubbles", detections.len());

        let entries = self.orchestrator.process(&image, &detections).await;
        let results = self.assembler.assemble(&image, entries).await;
        info!("Assembled {} bubbles with overlays", results.len());
        Ok(results)
    }
}
