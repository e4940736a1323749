// Core module: configuration, errors, and shared types

pub mod config;
pub mod errors;
pub mod types;

pub use config::Config;
pub use errors::{
    ConfigError, DetectionError, ExtractionError, OverlayError, PipelineError,
};
pub use types::{
    Bubble, BubbleEntry, BubbleResult, Detection, OverlayPatch, Region, SubRegion, TextPatch,
};
