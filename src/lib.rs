// Library exports for the bubble processing pipeline

pub mod core;
pub mod middleware;
pub mod orchestration;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions
pub use core::{
    config::Config,
    errors::{ConfigError, DetectionError, ExtractionError, OverlayError, PipelineError},
    types::{Bubble, BubbleEntry, BubbleResult, Detection, Region, SubRegion, TextPatch},
};

pub use middleware::{BreakerConfig, BreakerState, CircuitBreaker};

pub use orchestration::{BubblePipeline, PipelineOrchestrator, ResultAssembler};

pub use services::{
    Detector, DirSink, HttpDetector, HttpRecognizer, OverlaySink, OverlaySynthesizer,
    RecognizedRegion, Recognizer, RegionExtractor,
};

pub use utils::sample_border;
