// Custom error types for better error handling and debugging
//
// Using thiserror for ergonomic error definitions with:
// - Context preservation
// - Type-safe error matching
// - Source error chaining

use thiserror::Error;

/// Detector adapter errors. Any of these is fatal for a pipeline run: with no
/// detections there is nothing to process.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("detector request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("detector returned HTTP {status}")]
    BadStatus { status: u16 },

    #[error("malformed detector response: {0}")]
    MalformedResponse(String),
}

/// Recognition adapter errors for a single bubble. These are isolated per
/// task: the owning bubble is dropped and the batch continues.
///
/// "No text found" is not represented here; it is the `Ok(vec![])` outcome.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("recognition request timed out")]
    Timeout,

    #[error("recognition transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("recognition service returned HTTP {status}")]
    BadStatus { status: u16 },

    #[error("malformed recognition response: {0}")]
    MalformedResponse(String),

    #[error("recognition service unavailable (circuit open)")]
    Unavailable,

    #[error("failed to encode region image: {0}")]
    Encode(#[source] image::ImageError),
}

impl ExtractionError {
    /// Whether the transport layer may retry the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) => true,
            Self::BadStatus { status } => *status >= 500,
            Self::MalformedResponse(_) | Self::Unavailable | Self::Encode(_) => false,
        }
    }
}

/// Overlay synthesis errors for a single sub-region. Sibling sub-regions and
/// other bubbles proceed.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("invalid overlay region: {width}x{height}")]
    InvalidRegion { width: i32, height: i32 },

    #[error("overlay encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("overlay write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal pipeline errors. Per-bubble and per-subregion conditions are
/// recovered locally and reflected as omission, never raised through here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("detection unavailable: {0}")]
    DetectionUnavailable(#[from] DetectionError),

    #[error("image decoding failed: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("internal task failure: {0}")]
    Internal(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("confidence threshold must be in [0.0, 1.0], got {0}")]
    InvalidConfidenceThreshold(f32),

    #[error("overlap threshold must be in [0.0, 1.0], got {0}")]
    InvalidOverlapThreshold(f32),

    #[error("max concurrent extractions must be > 0")]
    InvalidConcurrencyLimit,

    #[error("request timeout must be > 0 seconds")]
    InvalidTimeout,

    #[error("invalid overlay directory: {0}")]
    InvalidOverlayDir(String),
}

// Convenience type aliases for Results
pub type DetectionResult<T> = Result<T, DetectionError>;
pub type ExtractionResult<T> = Result<T, ExtractionError>;
pub type OverlayResult<T> = Result<T, OverlayError>;
pub type PipelineResult<T> = Result<T, PipelineError>;
