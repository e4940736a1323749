use crate::core::errors::ConfigError;
use std::env;
use tracing::Level;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub log_level: Level,
}

/// Detector adapter configuration
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub endpoint: String,
    pub confidence_threshold: f32,
    pub overlap_threshold: f32,
}

/// Recognition adapter configuration
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    pub endpoint: String,
    /// Upper bound on in-flight extraction tasks. Tunable, not a correctness
    /// requirement; protects the recognition service from unbounded fan-out.
    pub max_concurrent: usize,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

/// Overlay output configuration
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub output_dir: String,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub detector: DetectorConfig,
    pub recognition: RecognitionConfig,
    pub overlay: OverlayConfig,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Result<Self, ConfigError> {
        let log_level = env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "trace" => Some(Level::TRACE),
                "debug" => Some(Level::DEBUG),
                "info" => Some(Level::INFO),
                "warn" | "warning" => Some(Level::WARN),
                "error" => Some(Level::ERROR),
                _ => None,
            })
            .unwrap_or(Level::INFO);

        Ok(Self {
            server: ServerConfig {
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                log_level,
            },
            detector: DetectorConfig {
                endpoint: env::var("DETECTOR_URL")
                    .unwrap_or_else(|_| "http://localhost:9001/detect".to_string()),
                confidence_threshold: env::var("CONFIDENCE_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.5),
                overlap_threshold: env::var("OVERLAP_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.3),
            },
            recognition: RecognitionConfig {
                endpoint: env::var("RECOGNIZER_URL")
                    .unwrap_or_else(|_| "http://localhost:9002/recognize".to_string()),
                max_concurrent: env::var("MAX_CONCURRENT_EXTRACTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        // Default: half the cores, at least 8. Extraction tasks
                        // spend most of their time waiting on the network.
                        let cores = num_cpus::get();
                        std::cmp::max(cores / 2, 8)
                    }),
                timeout_seconds: env::var("EXTRACTION_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
                max_retries: env::var("MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
            },
            overlay: OverlayConfig {
                output_dir: env::var("OVERLAY_DIR").unwrap_or_else(|_| "overlays".to_string()),
            },
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(ConfigError::InvalidConfidenceThreshold(
                self.detector.confidence_threshold,
            ));
        }

        if !(0.0..=1.0).contains(&self.detector.overlap_threshold) {
            return Err(ConfigError::InvalidOverlapThreshold(
                self.detector.overlap_threshold,
            ));
        }

        if self.recognition.max_concurrent == 0 {
            return Err(ConfigError::InvalidConcurrencyLimit);
        }

        if self.recognition.timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        if self.overlay.output_dir.is_empty() {
            return Err(ConfigError::InvalidOverlayDir(
                "overlay directory must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.server.port
    }

    pub fn server_host(&self) -> &str {
        &self.server.host
    }

    pub fn log_level(&self) -> Level {
        self.server.log_level
    }

    pub fn detector_endpoint(&self) -> &str {
        &self.detector.endpoint
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.detector.confidence_threshold
    }

    pub fn overlap_threshold(&self) -> f32 {
        self.detector.overlap_threshold
    }

    pub fn recognizer_endpoint(&self) -> &str {
        &self.recognition.endpoint
    }

    pub fn max_concurrent_extractions(&self) -> usize {
        self.recognition.max_concurrent
    }

    pub fn extraction_timeout_seconds(&self) -> u64 {
        self.recognition.timeout_seconds
    }

    pub fn max_retries(&self) -> u32 {
        self.recognition.max_retries
    }

    pub fn overlay_dir(&self) -> &str {
        &self.overlay.output_dir
    }
}

// Note: No Default implementation because Config::new() can fail
// Users should explicitly call Config::new()? and handle errors

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server: ServerConfig {
                port: 3000,
                host: "127.0.0.1".to_string(),
                log_level: Level::INFO,
            },
            detector: DetectorConfig {
                endpoint: "http://localhost:9001/detect".to_string(),
                confidence_threshold: 0.5,
                overlap_threshold: 0.3,
            },
            recognition: RecognitionConfig {
                endpoint: "http://localhost:9002/recognize".to_string(),
                max_concurrent: 8,
                timeout_seconds: 60,
                max_retries: 3,
            },
            overlay: OverlayConfig {
                output_dir: "overlays".to_string(),
            },
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let mut config = base_config();
        config.detector.confidence_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfidenceThreshold(_))
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = base_config();
        config.recognition.max_concurrent = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrencyLimit)
        ));
    }
}
