// Service modules: adapters for external capabilities and overlay synthesis

pub mod detection;
pub mod extraction;
pub mod overlay;
pub mod recognition;

pub use detection::{Detector, HttpDetector};
pub use extraction::RegionExtractor;
pub use overlay::{DirSink, OverlaySink, OverlaySynthesizer};
pub use recognition::{HttpRecognizer, RecognizedRegion, Recognizer};
