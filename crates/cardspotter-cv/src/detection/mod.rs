//! Card detection and the per-frame recognition pipeline.

pub mod config;
pub mod detector;
pub mod recognizer;

pub use config::{DetectionConfig, RecognizerConfig, VisualizationConfig};
pub use detector::CardDetector;
pub use recognizer::{CardRecognizer, FrameResult, RecognitionStats};
