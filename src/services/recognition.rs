// Recognition adapter: wraps the external text recognition capability
//
// One call per cropped bubble, no shared session state across calls. The
// transport layer owns the retry policy and circuit breaker; the orchestrator
// above only sees success, "no text", or a single opaque task failure.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::config::Config;
use crate::core::errors::{ExtractionError, ExtractionResult};
use crate::middleware::circuit_breaker::CircuitBreaker;

/// One polygon recognized inside a crop, in crop-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedRegion {
    pub vertices: Vec<(i32, i32)>,
    pub text: String,
    pub locale: String,
}

/// External text recognition capability.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize text regions in one encoded crop.
    ///
    /// An empty result means "no text found" and is not an error.
    async fn recognize(&self, image_png: &[u8]) -> ExtractionResult<Vec<RecognizedRegion>>;
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    image: &'a str,
}

/// Raw recognition response shape, validated before leaving this module.
#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    regions: Vec<RawRegion>,
}

#[derive(Debug, Deserialize)]
struct RawRegion {
    vertices: Vec<RawVertex>,
    text: String,
    locale: String,
}

#[derive(Debug, Deserialize)]
struct RawVertex {
    x: f32,
    y: f32,
}

/// HTTP-backed recognition adapter with bounded retries and a circuit
/// breaker in front of the transport.
pub struct HttpRecognizer {
    endpoint: String,
    client: reqwest::Client,
    breaker: CircuitBreaker,
    max_retries: u32,
}

impl HttpRecognizer {
    pub fn new(config: &Config) -> ExtractionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.extraction_timeout_seconds()))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(ExtractionError::Transport)?;

        Ok(Self {
            endpoint: config.recognizer_endpoint().to_string(),
            client,
            breaker: CircuitBreaker::default(),
            max_retries: config.max_retries(),
        })
    }

    async fn request_once(&self, image_png: &[u8]) -> ExtractionResult<Vec<RecognizedRegion>> {
        let encoded = general_purpose::STANDARD.encode(image_png);
        let request = RecognizeRequest { image: &encoded };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Timeout
                } else {
                    ExtractionError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::BadStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(ExtractionError::Transport)?;
        parse_regions(&body)
    }
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    #[instrument(skip(self, image_png), fields(bytes = image_png.len()))]
    async fn recognize(&self, image_png: &[u8]) -> ExtractionResult<Vec<RecognizedRegion>> {
        let mut attempt = 0;
        loop {
            if !self.breaker.allow() {
                return Err(ExtractionError::Unavailable);
            }

            match self.request_once(image_png).await {
                Ok(regions) => {
                    self.breaker.on_success();
                    debug!("Recognition returned {} regions", regions.len());
                    return Ok(regions);
                }
                Err(err) => {
                    self.breaker.on_failure();
                    if attempt < self.max_retries && err.is_retryable() {
                        let backoff = Duration::from_millis(250 << attempt.min(4));
                        warn!(
                            attempt = attempt + 1,
                            error = %err,
                            "Recognition call failed, retrying in {:?}",
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// Parse and validate a recognition response body.
///
/// A missing or empty `regions` list is the "no text found" outcome; a region
/// with no vertices or any undecodable structure is a malformed response.
fn parse_regions(body: &str) -> ExtractionResult<Vec<RecognizedRegion>> {
    let response: RecognizeResponse = serde_json::from_str(body)
        .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

    let mut regions = Vec::with_capacity(response.regions.len());
    for raw in response.regions {
        if raw.vertices.is_empty() {
            return Err(ExtractionError::MalformedResponse(
                "region with no vertices".to_string(),
            ));
        }
        regions.push(RecognizedRegion {
            vertices: raw
                .vertices
                .into_iter()
                .map(|v| (v.x as i32, v.y as i32))
                .collect(),
            text: raw.text,
            locale: raw.locale,
        });
    }

    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_regions() {
        let body = r#"{"regions":[
            {"vertices":[{"x":5.0,"y":5.0},{"x":25.0,"y":15.0}],"text":"やあ","locale":"ja"}
        ]}"#;
        let regions = parse_regions(body).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].vertices, vec![(5, 5), (25, 15)]);
        assert_eq!(regions[0].text, "やあ");
        assert_eq!(regions[0].locale, "ja");
    }

    #[test]
    fn no_text_is_an_empty_list_not_an_error() {
        assert!(parse_regions(r#"{"regions":[]}"#).unwrap().is_empty());
        assert!(parse_regions(r#"{}"#).unwrap().is_empty());
    }

    #[test]
    fn region_without_vertices_is_malformed() {
        let body = r#"{"regions":[{"vertices":[],"text":"x","locale":"en"}]}"#;
        assert!(matches!(
            parse_regions(body),
            Err(ExtractionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_text_field_is_malformed() {
        let body = r#"{"regions":[{"vertices":[{"x":1.0,"y":1.0}],"locale":"en"}]}"#;
        assert!(matches!(
            parse_regions(body),
            Err(ExtractionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn vertex_coordinates_are_truncated_to_integers() {
        let body = r#"{"regions":[
            {"vertices":[{"x":5.9,"y":5.2},{"x":25.7,"y":15.1}],"text":"t","locale":"en"}
        ]}"#;
        let regions = parse_regions(body).unwrap();
        assert_eq!(regions[0].vertices, vec![(5, 5), (25, 15)]);
    }
}
