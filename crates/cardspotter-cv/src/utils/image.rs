//! Image loading, saving, and frame preprocessing.

use crate::Result;
use anyhow::Context;
use opencv::{
    core::{Mat, Size},
    imgcodecs::{self, IMREAD_COLOR, IMREAD_GRAYSCALE},
    imgproc::{self, ADAPTIVE_THRESH_MEAN_C, COLOR_BGR2GRAY, THRESH_BINARY_INV},
    prelude::*,
};
use std::path::Path;

/// Segment a color frame into the binary mask the detector consumes:
/// grayscale, 5x5 Gaussian blur, then inverted adaptive mean threshold.
pub fn preprocess_frame(frame: &Mat) -> Result<Mat> {
    let grayscale = to_grayscale(frame)?;

    let mut blurred = Mat::default();
    imgproc::gaussian_blur(
        &grayscale,
        &mut blurred,
        Size::new(5, 5),
        0.0,
        0.0,
        opencv::core::BORDER_DEFAULT,
    )
    .context("Gaussian blur failed")?;

    let mut binary = Mat::default();
    imgproc::adaptive_threshold(
        &blurred,
        &mut binary,
        255.0,
        ADAPTIVE_THRESH_MEAN_C,
        THRESH_BINARY_INV,
        11,
        2.0,
    )
    .context("adaptive threshold failed")?;

    Ok(binary)
}

/// Convert to single-channel grayscale; already-gray images pass through.
pub fn to_grayscale(image: &Mat) -> Result<Mat> {
    if image.channels() == 1 {
        return Ok(image.clone());
    }
    let mut gray = Mat::default();
    imgproc::cvt_color(image, &mut gray, COLOR_BGR2GRAY, 0)
        .context("grayscale conversion failed")?;
    Ok(gray)
}

/// Image file helpers for the driver binary and tests.
pub struct ImageUtils;

impl ImageUtils {
    /// Load an image as a grayscale Mat.
    pub fn load_grayscale<P: AsRef<Path>>(path: P) -> Result<Mat> {
        let path_str = path.as_ref().to_string_lossy();
        let image = imgcodecs::imread(&path_str, IMREAD_GRAYSCALE)
            .with_context(|| format!("failed to load grayscale image: {}", path_str))?;
        anyhow::ensure!(!image.empty(), "could not decode image: {}", path_str);
        Ok(image)
    }

    /// Load an image as a color (BGR) Mat.
    pub fn load_color<P: AsRef<Path>>(path: P) -> Result<Mat> {
        let path_str = path.as_ref().to_string_lossy();
        let image = imgcodecs::imread(&path_str, IMREAD_COLOR)
            .with_context(|| format!("failed to load color image: {}", path_str))?;
        anyhow::ensure!(!image.empty(), "could not decode image: {}", path_str);
        Ok(image)
    }

    /// Save a Mat as an image file.
    pub fn save_image<P: AsRef<Path>>(mat: &Mat, path: P) -> Result<()> {
        let path_str = path.as_ref().to_string_lossy();
        imgcodecs::imwrite(&path_str, mat, &opencv::core::Vector::new())
            .with_context(|| format!("failed to save image: {}", path_str))?;
        Ok(())
    }
}
