// Detector adapter: wraps the external bubble detection capability
//
// The detector is a remote model endpoint that accepts a base64-encoded image
// and returns center-format bounding boxes. Everything past this adapter
// works with typed `Detection` records; raw JSON never leaks upstream.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::Config;
use crate::core::errors::{DetectionError, DetectionResult};
use crate::core::types::Detection;

/// External bubble detection capability.
///
/// Injected into the pipeline rather than reached through a global handle so
/// tests can substitute a scripted double.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect candidate bubbles in an encoded image.
    ///
    /// `confidence` and `overlap` are thresholds in [0, 1] forwarded to the
    /// detector. Any failure is fatal for the run.
    async fn detect(
        &self,
        image_bytes: &[u8],
        confidence: f32,
        overlap: f32,
    ) -> DetectionResult<Vec<Detection>>;
}

/// Raw detector response shape, validated before leaving this module.
#[derive(Debug, Deserialize)]
struct DetectResponse {
    predictions: Vec<RawPrediction>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    confidence: f32,
}

/// HTTP-backed detector adapter.
pub struct HttpDetector {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpDetector {
    pub fn new(config: &Config) -> DetectionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.extraction_timeout_seconds()))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            endpoint: config.detector_endpoint().to_string(),
            client,
        })
    }
}

#[async_trait]
impl Detector for HttpDetector {
    #[instrument(skip(self, image_bytes), fields(bytes = image_bytes.len()))]
    async fn detect(
        &self,
        image_bytes: &[u8],
        confidence: f32,
        overlap: f32,
    ) -> DetectionResult<Vec<Detection>> {
        let payload = general_purpose::STANDARD.encode(image_bytes);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("confidence", confidence.to_string()),
                ("overlap", overlap.to_string()),
            ])
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectionError::BadStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let detections = parse_predictions(&body)?;
        debug!("Detector returned {} boxes", detections.len());
        Ok(detections)
    }
}

/// Parse and validate a detector response body.
fn parse_predictions(body: &str) -> DetectionResult<Vec<Detection>> {
    let response: DetectResponse = serde_json::from_str(body)
        .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;

    let mut detections = Vec::with_capacity(response.predictions.len());
    for raw in response.predictions {
        if raw.width <= 0.0 || raw.height <= 0.0 {
            return Err(DetectionError::MalformedResponse(format!(
                "non-positive box size {}x{}",
                raw.width, raw.height
            )));
        }
        if !raw.confidence.is_finite() {
            return Err(DetectionError::MalformedResponse(
                "non-finite confidence".to_string(),
            ));
        }
        detections.push(Detection {
            x_center: raw.x,
            y_center: raw.y,
            width: raw.width,
            height: raw.height,
            confidence: raw.confidence,
        });
    }

    Ok(detections)
}
