//! Feature-based card identification against the template library.

use super::{FeatureExtractor, MatcherConfig, Template};
use crate::Result;
use crate::utils::image::to_grayscale;
use anyhow::Context;
use opencv::{
    core::{DMatch, Mat, NORM_HAMMING, Vector, no_array},
    features2d::BFMatcher,
    prelude::*,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of matching one card image against the template library.
///
/// "No good match" is a normal outcome, not an error: identity stays absent
/// and the score stays 0.0 for the caller to interpret.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub identity: Option<String>,
    pub score: f64,
}

impl MatchOutcome {
    pub fn no_match() -> Self {
        Self::default()
    }
}

/// ORB/Hamming nearest-neighbor matcher with a ratio test.
pub struct CardMatcher {
    config: MatcherConfig,
}

impl CardMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Identify a card crop against the template library.
    ///
    /// Returns the label of the strictly-best-scoring template; ties keep the
    /// earliest-enumerated template, so the caller must hand templates over
    /// in a fixed order. An empty library, a featureless crop, or a library
    /// where every template was skipped all yield [`MatchOutcome::no_match`].
    pub fn identify(&self, card_image: &Mat, templates: &[Template]) -> Result<MatchOutcome> {
        let gray = to_grayscale(card_image)?;

        let mut extractor = FeatureExtractor::new(self.config.max_features)?;
        let (keypoints, descriptors) = extractor.detect_and_compute(&gray)?;
        if descriptors.empty() {
            return Ok(MatchOutcome::no_match());
        }

        self.score_templates(keypoints.len(), &descriptors, templates)
    }

    /// Score every template and pick the winner.
    ///
    /// Scores are computed per template independently (and in parallel when
    /// the `parallel` feature is on), then reduced sequentially in
    /// enumeration order so the first-seen-on-tie rule holds either way.
    fn score_templates(
        &self,
        card_keypoints: usize,
        card_descriptors: &Mat,
        templates: &[Template],
    ) -> Result<MatchOutcome> {
        #[cfg(feature = "parallel")]
        let scores: Result<Vec<Option<f64>>> = templates
            .par_iter()
            .map(|template| self.score_template(card_keypoints, card_descriptors, template))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let scores: Result<Vec<Option<f64>>> = templates
            .iter()
            .map(|template| self.score_template(card_keypoints, card_descriptors, template))
            .collect();

        let mut best = MatchOutcome::no_match();
        for (template, score) in templates.iter().zip(scores?) {
            let Some(score) = score else { continue };
            if score > best.score {
                best.score = score;
                best.identity = Some(template.name.clone());
            }
        }

        Ok(best)
    }

    /// Score one template against the card descriptors, or `None` when the
    /// template carries no descriptors and must be skipped.
    fn score_template(
        &self,
        card_keypoints: usize,
        card_descriptors: &Mat,
        template: &Template,
    ) -> Result<Option<f64>> {
        if template.descriptors.empty() {
            return Ok(None);
        }

        let matcher = BFMatcher::create(NORM_HAMMING, false)
            .context("failed to create brute-force matcher")?;

        let mut knn = Vector::<Vector<DMatch>>::new();
        matcher
            .knn_train_match(
                &template.descriptors,
                card_descriptors,
                &mut knn,
                2,
                &no_array(),
                false,
            )
            .context("descriptor matching failed")?;

        let mut kept = 0usize;
        for pair in knn.iter() {
            // The ratio test needs both neighbors; a single candidate is
            // ambiguous by construction.
            if pair.len() != 2 {
                continue;
            }
            let nearest = pair.get(0)?;
            let second = pair.get(1)?;
            if f64::from(nearest.distance) < self.config.ratio_threshold * f64::from(second.distance)
            {
                kept += 1;
            }
        }

        // Normalized match density: penalizes both sparse matches and
        // keypoint-count mismatches between the two images.
        let denominator = template.keypoints.len().max(card_keypoints);
        if denominator == 0 {
            return Ok(None);
        }
        Ok(Some(kept as f64 / denominator as f64))
    }
}

impl Default for CardMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}
