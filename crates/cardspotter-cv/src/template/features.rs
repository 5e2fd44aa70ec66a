//! ORB keypoint/descriptor extraction.

use crate::Result;
use anyhow::Context;
use opencv::{
    core::{KeyPoint, Mat, Vector, no_array},
    features2d::{ORB, ORB_ScoreType},
    prelude::*,
};

/// Scale/rotation-invariant keypoint detector producing fixed-length binary
/// descriptors, suitable for Hamming-distance matching.
pub struct FeatureExtractor {
    orb: opencv::core::Ptr<ORB>,
}

impl FeatureExtractor {
    /// Create an extractor bounded at `max_features` keypoints per image.
    pub fn new(max_features: i32) -> Result<Self> {
        let orb = ORB::create(
            max_features,
            1.2,
            8,
            31,
            0,
            2,
            ORB_ScoreType::HARRIS_SCORE,
            31,
            20,
        )
        .context("failed to create ORB detector")?;
        Ok(Self { orb })
    }

    /// Detect keypoints and compute their binary descriptors.
    ///
    /// A featureless image (e.g. a uniform blank) yields empty results, not
    /// an error; callers treat that as a data-insufficiency skip.
    pub fn detect_and_compute(&mut self, image: &Mat) -> Result<(Vector<KeyPoint>, Mat)> {
        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        self.orb
            .detect_and_compute(image, &no_array(), &mut keypoints, &mut descriptors, false)
            .context("ORB detect_and_compute failed")?;
        Ok((keypoints, descriptors))
    }
}
