//! Template loading utilities.

use super::{FeatureExtractor, MatcherConfig, Template};
use crate::Result;
use log::{info, warn};
use opencv::{
    core::{Mat, Size},
    imgcodecs::{self, IMREAD_GRAYSCALE},
    imgproc::{self, INTER_LINEAR},
    prelude::*,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Canonical template resolution; every template is resized to this before
/// storage, for speed and consistency across source images.
pub const CANONICAL_SIZE: (i32, i32) = (300, 400);

/// Structured failures at the template directory boundary.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read template directory {dir}: {source}")]
    ReadDir {
        dir: PathBuf,
        source: std::io::Error,
    },
}

/// Loads labeled template images from one or more directories.
///
/// Labels are file stems; accepted extensions default to `.png` and `.jpg`.
/// Templates come back sorted by label, which fixes the enumeration order the
/// matcher uses to break score ties.
pub struct TemplateLoader {
    template_dirs: Vec<PathBuf>,
    supported_extensions: Vec<String>,
    canonical_size: (i32, i32),
    max_features: i32,
}

impl TemplateLoader {
    pub fn new() -> Self {
        Self {
            template_dirs: Vec::new(),
            supported_extensions: vec!["png".to_string(), "jpg".to_string()],
            canonical_size: CANONICAL_SIZE,
            max_features: MatcherConfig::default().max_features,
        }
    }

    /// Add a template directory.
    pub fn add_template_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.template_dirs.push(dir.as_ref().to_path_buf());
        self
    }

    /// Add a supported extension (lowercase, without the dot).
    pub fn add_extension(mut self, ext: String) -> Self {
        self.supported_extensions.push(ext);
        self
    }

    /// Override the canonical template resolution.
    pub fn with_canonical_size(mut self, width: i32, height: i32) -> Self {
        self.canonical_size = (width, height);
        self
    }

    /// Override the keypoint bound used when precomputing features.
    pub fn with_max_features(mut self, max_features: i32) -> Self {
        self.max_features = max_features;
        self
    }

    /// Load every template from the configured directories.
    ///
    /// Unreadable images are skipped with a warning; missing directories are
    /// skipped too. An empty result is legal and leaves every card
    /// unidentified downstream.
    pub fn load_all_templates(&self) -> Result<Vec<Template>> {
        let mut extractor = FeatureExtractor::new(self.max_features)?;
        let mut templates = Vec::new();

        for dir in &self.template_dirs {
            if !dir.exists() {
                warn!("template directory does not exist, skipping: {:?}", dir);
                continue;
            }

            let entries = fs::read_dir(dir).map_err(|source| LoadError::ReadDir {
                dir: dir.clone(),
                source,
            })?;

            for entry in entries {
                let entry = entry.map_err(|source| LoadError::ReadDir {
                    dir: dir.clone(),
                    source,
                })?;
                let path = entry.path();

                if !self.is_supported(&path) {
                    continue;
                }
                let Some(stem) = path.file_stem() else {
                    continue;
                };
                let name = stem.to_string_lossy().to_string();

                match self.load_canonical_image(&path)? {
                    Some(image) => templates.push(Template::new(name, image, &mut extractor)?),
                    None => warn!("could not load template image: {:?}", path),
                }
            }
        }

        // Fixed, reproducible enumeration order: the matcher's tie-break
        // keeps the first-seen of equal scores, so order must not depend on
        // directory iteration.
        templates.sort_by(|a, b| a.name.cmp(&b.name));

        info!("loaded {} template images", templates.len());
        Ok(templates)
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                self.supported_extensions
                    .contains(&ext.to_string_lossy().to_lowercase())
            })
            .unwrap_or(false)
    }

    /// Load one image as grayscale at the canonical resolution, returning
    /// `None` when the file cannot be decoded.
    fn load_canonical_image(&self, path: &Path) -> Result<Option<Mat>> {
        let raw = imgcodecs::imread(&path.to_string_lossy(), IMREAD_GRAYSCALE)?;
        if raw.empty() {
            return Ok(None);
        }

        let mut resized = Mat::default();
        imgproc::resize(
            &raw,
            &mut resized,
            Size::new(self.canonical_size.0, self.canonical_size.1),
            0.0,
            0.0,
            INTER_LINEAR,
        )?;

        Ok(Some(resized))
    }
}

impl Default for TemplateLoader {
    fn default() -> Self {
        Self::new()
    }
}
