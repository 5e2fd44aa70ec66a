//! Cardspotter Computer Vision Library
//!
//! Per-frame playing-card recognition: a geometric shape classifier picks
//! card-shaped contours out of a binary mask, and an ORB feature matcher
//! assigns each detected card an identity from a library of labeled
//! template images.

pub mod card;
pub mod detection;
pub mod template;
pub mod utils;

// Re-export commonly used types
pub use card::{Card, CardReport};
pub use detection::{CardDetector, CardRecognizer, DetectionConfig, RecognizerConfig};
pub use template::{CardMatcher, MatchOutcome, MatcherConfig, Template, TemplateLoader};

// Error handling
pub type Result<T> = anyhow::Result<T>;
