//! Detection and pipeline configuration.

use crate::template::MatcherConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Thresholds for the geometric card-shape test.
///
/// Defaults favor robustness over precision: a loose polygon approximation
/// tolerates lighting-induced boundary noise, and the wide aspect range
/// covers both portrait and landscape camera orientation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum enclosed contour area in px²; smaller blobs are noise.
    pub min_area: f64,
    /// Polygon approximation tolerance as a fraction of the perimeter.
    pub approx_epsilon: f64,
    /// Accepted bounding-box aspect ratio, exclusive on both ends.
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Minimum contour-area / hull-area ratio, exclusive. Low solidity means
    /// occlusion, overlap, or a non-card blob.
    pub min_solidity: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_area: 500.0,
            approx_epsilon: 0.05,
            min_aspect_ratio: 0.5,
            max_aspect_ratio: 2.0,
            min_solidity: 0.8,
        }
    }
}

/// Visualization configuration for annotated output frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    pub draw_outlines: bool,
    pub draw_labels: bool,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            draw_outlines: true,
            draw_labels: true,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    pub detection: DetectionConfig,
    pub matcher: MatcherConfig,
    pub template_dirs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub visualization: VisualizationConfig,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            matcher: MatcherConfig::default(),
            template_dirs: vec!["assets/templates".into()],
            output_dir: "outputs".into(),
            visualization: VisualizationConfig::default(),
        }
    }
}
