//! Template library: labeled reference card images and feature matching.

pub mod features;
pub mod loader;
pub mod matcher;

pub use features::FeatureExtractor;
pub use loader::TemplateLoader;
pub use matcher::{CardMatcher, MatchOutcome};

use crate::Result;
use opencv::core::{KeyPoint, Mat, Vector};
use serde::{Deserialize, Serialize};

/// A labeled reference image with its ORB features precomputed at load time.
///
/// Templates are loaded once before the frame loop, never mutated afterwards,
/// and shared read-only across all frames and cards.
#[derive(Debug, Clone)]
pub struct Template {
    /// Label derived from the source file name, extension stripped.
    pub name: String,
    /// Fixed-size grayscale reference image.
    pub image: Mat,
    pub keypoints: Vector<KeyPoint>,
    pub descriptors: Mat,
}

impl Template {
    /// Build a template, computing its features up front so matching never
    /// has to touch the image again.
    pub fn new(name: String, image: Mat, extractor: &mut FeatureExtractor) -> Result<Self> {
        let (keypoints, descriptors) = extractor.detect_and_compute(&image)?;
        Ok(Self {
            name,
            image,
            keypoints,
            descriptors,
        })
    }
}

/// Feature matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Upper bound on ORB keypoints per image, not a guarantee.
    pub max_features: i32,
    /// Lowe ratio test threshold: a match is kept only if its nearest-neighbor
    /// distance is below this fraction of the second-nearest distance.
    pub ratio_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_features: 2000,
            ratio_threshold: 0.75,
        }
    }
}
