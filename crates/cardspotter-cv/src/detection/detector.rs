//! Geometric shape classifier: which contours plausibly outline a card.

use super::config::DetectionConfig;
use crate::Result;
use crate::card::Card;
use anyhow::Context;
use opencv::{
    core::{Mat, Point, Vector},
    imgproc::{self, CHAIN_APPROX_SIMPLE, RETR_EXTERNAL},
};

/// Classifies contours from a binary mask and turns accepted ones into
/// [`Card`]s by cropping the color frame at their bounding boxes.
///
/// A contour that fails the shape test is simply not a card; nothing here is
/// an error, and an empty mask yields an empty list.
pub struct CardDetector {
    config: DetectionConfig,
}

impl CardDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Detect cards: find external contours in the binary mask, keep the
    /// card-shaped ones, crop each from the frame.
    ///
    /// Output order follows contour discovery order and carries no meaning.
    pub fn detect(&self, binary: &Mat, frame: &Mat) -> Result<Vec<Card>> {
        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            binary,
            &mut contours,
            RETR_EXTERNAL,
            CHAIN_APPROX_SIMPLE,
            Point::default(),
        )
        .context("contour extraction failed")?;

        let mut cards = Vec::new();
        for contour in contours.iter() {
            if self.is_card_shaped(&contour)? {
                cards.push(Card::from_contour(contour, frame)?);
            }
        }

        Ok(cards)
    }

    /// The per-contour acceptance test. All four conditions must hold.
    pub fn is_card_shaped(&self, contour: &Vector<Point>) -> Result<bool> {
        let area = imgproc::contour_area(contour, false)?;
        if area < self.config.min_area {
            return Ok(false);
        }

        let perimeter = imgproc::arc_length(contour, true)?;
        let epsilon = self.config.approx_epsilon * perimeter;
        let mut approx = Vector::<Point>::new();
        imgproc::approx_poly_dp(contour, &mut approx, epsilon, true)?;
        // Cards are rectangular; the loose tolerance above absorbs boundary
        // noise, so anything that is not a quadrilateral now is not a card.
        if approx.len() != 4 {
            return Ok(false);
        }

        let rect = imgproc::bounding_rect(&approx)?;
        let aspect_ratio = f64::from(rect.width) / f64::from(rect.height);
        if aspect_ratio <= self.config.min_aspect_ratio
            || aspect_ratio >= self.config.max_aspect_ratio
        {
            return Ok(false);
        }

        Ok(self.solidity(contour, area)? > self.config.min_solidity)
    }

    /// Contour area over convex-hull area.
    fn solidity(&self, contour: &Vector<Point>, area: f64) -> Result<f64> {
        let mut hull = Vector::<Point>::new();
        imgproc::convex_hull(contour, &mut hull, false, true)?;
        let hull_area = imgproc::contour_area(&hull, false)?;
        if hull_area <= 0.0 {
            return Ok(0.0);
        }
        Ok(area / hull_area)
    }
}

impl Default for CardDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{CV_8UC1, CV_8UC3, Rect, Scalar};
    use opencv::imgproc::{FILLED, LINE_8};
    use opencv::prelude::*;

    fn contour_of(points: &[(i32, i32)]) -> Vector<Point> {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_area_at_threshold_is_accepted() {
        let detector = CardDetector::default();
        // 25x20 rectangle, enclosed area exactly 500.
        let contour = contour_of(&[(0, 0), (25, 0), (25, 20), (0, 20)]);
        assert!(detector.is_card_shaped(&contour).unwrap());
    }

    #[test]
    fn test_area_below_threshold_is_rejected() {
        let detector = CardDetector::default();
        // Quadrilateral with enclosed area 490.
        let contour = contour_of(&[(0, 0), (25, 0), (25, 20), (1, 20)]);
        assert!(!detector.is_card_shaped(&contour).unwrap());
    }

    #[test]
    fn test_aspect_ratio_boundaries_are_rejected() {
        let detector = CardDetector::default();
        // Bounding boxes of 80x40 and 40x80: ratio exactly 2.0 and 0.5.
        let landscape = contour_of(&[(0, 0), (79, 0), (79, 39), (0, 39)]);
        assert!(!detector.is_card_shaped(&landscape).unwrap());

        let portrait = contour_of(&[(0, 0), (39, 0), (39, 79), (0, 79)]);
        assert!(!detector.is_card_shaped(&portrait).unwrap());
    }

    #[test]
    fn test_square_is_accepted() {
        let detector = CardDetector::default();
        let square = contour_of(&[(0, 0), (49, 0), (49, 49), (0, 49)]);
        assert!(detector.is_card_shaped(&square).unwrap());
    }

    #[test]
    fn test_solidity_at_boundary_is_rejected() {
        let detector = CardDetector::default();
        // Square with a notch pulled in to (50,60): area 8000, hull 10000.
        let at_boundary = contour_of(&[(0, 0), (100, 0), (100, 100), (50, 60), (0, 100)]);
        let area = imgproc::contour_area(&at_boundary, false).unwrap();
        let solidity = detector.solidity(&at_boundary, area).unwrap();
        assert_eq!(solidity, 0.8);
        assert!(!(solidity > detector.config.min_solidity));

        // Shallower notch at (50,62): area 8100, solidity 0.81.
        let above = contour_of(&[(0, 0), (100, 0), (100, 100), (50, 62), (0, 100)]);
        let area = imgproc::contour_area(&above, false).unwrap();
        let solidity = detector.solidity(&above, area).unwrap();
        assert_eq!(solidity, 0.81);
        assert!(solidity > detector.config.min_solidity);
    }

    #[test]
    fn test_concave_quadrilateral_is_rejected() {
        let detector = CardDetector::default();
        // A dart: four vertices survive approximation, but the reflex corner
        // drops solidity to 0.65.
        let dart = contour_of(&[(0, 0), (100, 0), (50, 30), (50, 100)]);
        assert!(!detector.is_card_shaped(&dart).unwrap());
    }

    fn blob_mask(rect: Rect) -> Mat {
        let mut mask =
            Mat::new_rows_cols_with_default(300, 300, CV_8UC1, Scalar::all(0.0)).unwrap();
        imgproc::rectangle(&mut mask, rect, Scalar::all(255.0), FILLED, LINE_8, 0).unwrap();
        mask
    }

    #[test]
    fn test_single_blob_yields_one_card_with_exact_geometry() {
        let detector = CardDetector::default();
        let mask = blob_mask(Rect::new(50, 50, 100, 150));
        let frame =
            Mat::new_rows_cols_with_default(300, 300, CV_8UC3, Scalar::all(90.0)).unwrap();

        let cards = detector.detect(&mask, &frame).unwrap();
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!((card.x, card.y), (50, 50));
        assert_eq!((card.width, card.height), (100, 150));
        assert_eq!(card.image.cols(), 100);
        assert_eq!(card.image.rows(), 150);
    }

    #[test]
    fn test_detect_is_deterministic() {
        let detector = CardDetector::default();
        let mut mask = blob_mask(Rect::new(20, 30, 80, 100));
        imgproc::rectangle(
            &mut mask,
            Rect::new(160, 140, 90, 120),
            Scalar::all(255.0),
            FILLED,
            LINE_8,
            0,
        )
        .unwrap();
        let frame =
            Mat::new_rows_cols_with_default(300, 300, CV_8UC3, Scalar::all(90.0)).unwrap();

        let first = detector.detect(&mask, &frame).unwrap();
        let second = detector.detect(&mask, &frame).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.bounding_rect(), b.bounding_rect());
        }
    }

    #[test]
    fn test_empty_mask_yields_no_cards() {
        let detector = CardDetector::default();
        let mask = Mat::new_rows_cols_with_default(300, 300, CV_8UC1, Scalar::all(0.0)).unwrap();
        let frame =
            Mat::new_rows_cols_with_default(300, 300, CV_8UC3, Scalar::all(90.0)).unwrap();

        let cards = detector.detect(&mask, &frame).unwrap();
        assert!(cards.is_empty());
    }

    #[test]
    fn test_speckle_noise_is_rejected() {
        let detector = CardDetector::default();
        // 10x10 blob: comfortably under the area threshold.
        let mask = blob_mask(Rect::new(40, 40, 10, 10));
        let frame =
            Mat::new_rows_cols_with_default(300, 300, CV_8UC3, Scalar::all(90.0)).unwrap();

        let cards = detector.detect(&mask, &frame).unwrap();
        assert!(cards.is_empty());
    }
}
