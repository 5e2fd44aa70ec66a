//! Card entity: geometry, cropped pixels, and identification result for one
//! detected region within a single frame.

use crate::Result;
use anyhow::Context;
use opencv::{
    core::{Mat, Point, Rect, Scalar, Vector},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};
use serde::{Deserialize, Serialize};

/// A detected card candidate in one frame.
///
/// Created by [`crate::CardDetector`] from an accepted contour, assigned an
/// identity exactly once by the matcher result, and discarded at the end of
/// the frame. Nothing carries over between frames.
#[derive(Debug, Clone)]
pub struct Card {
    /// Outline of the card in frame coordinates.
    pub contour: Vector<Point>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Owned copy of the frame pixels at the bounding box. The capture loop
    /// overwrites the frame buffer every iteration, so this must never be a
    /// view into it.
    pub image: Mat,
    /// Best-matching template label, absent until the matcher assigns it.
    pub identity: Option<String>,
    /// Matcher score in `[0, 1]`; 0.0 until assigned. Not a probability.
    pub confidence: f64,
}

impl Card {
    /// Build a card from an accepted contour, cropping the frame at the
    /// contour's axis-aligned bounding box.
    pub fn from_contour(contour: Vector<Point>, frame: &Mat) -> Result<Self> {
        let rect = imgproc::bounding_rect(&contour).context("bounding rect failed")?;
        let image = Mat::roi(frame, rect)
            .context("card crop out of frame bounds")?
            .try_clone()
            .context("failed to copy card pixels")?;

        Ok(Self {
            contour,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            image,
            identity: None,
            confidence: 0.0,
        })
    }

    /// Attach the matcher result. The only mutation a card undergoes.
    pub fn update_identity(&mut self, identity: Option<String>, confidence: f64) {
        self.identity = identity;
        self.confidence = confidence;
    }

    pub fn bounding_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    // Overlay color, BGR green.
    fn draw_color() -> Scalar {
        Scalar::new(0.0, 255.0, 0.0, 255.0)
    }

    /// Draw the card outline and its label onto a frame.
    pub fn draw_on_frame(&self, frame: &mut Mat) -> Result<()> {
        self.draw_outline(frame)?;
        self.draw_label(frame)
    }

    pub fn draw_outline(&self, frame: &mut Mat) -> Result<()> {
        let outline: Vector<Vector<Point>> = Vector::from_iter([self.contour.clone()]);
        imgproc::draw_contours(
            frame,
            &outline,
            -1,
            Self::draw_color(),
            2,
            LINE_8,
            &opencv::core::no_array(),
            0,
            Point::default(),
        )
        .context("failed to draw card outline")
    }

    pub fn draw_label(&self, frame: &mut Mat) -> Result<()> {
        let label = format!(
            "{} ({:.2})",
            self.identity.as_deref().unwrap_or("unknown"),
            self.confidence
        );
        imgproc::put_text(
            frame,
            &label,
            Point::new(self.x, self.y - 10),
            FONT_HERSHEY_SIMPLEX,
            0.9,
            Self::draw_color(),
            2,
            LINE_8,
            false,
        )
        .context("failed to draw card label")
    }
}

/// Serializable summary of a detected card, for JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardReport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub identity: Option<String>,
    pub confidence: f64,
}

impl From<&Card> for CardReport {
    fn from(card: &Card) -> Self {
        Self {
            x: card.x,
            y: card.y,
            width: card.width,
            height: card.height,
            identity: card.identity.clone(),
            confidence: card.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::CV_8UC3;

    fn test_card() -> Card {
        let contour = Vector::from_iter([
            Point::new(10, 10),
            Point::new(60, 10),
            Point::new(60, 90),
            Point::new(10, 90),
        ]);
        let frame =
            Mat::new_rows_cols_with_default(120, 120, CV_8UC3, Scalar::all(255.0)).unwrap();
        Card::from_contour(contour, &frame).unwrap()
    }

    #[test]
    fn test_from_contour_geometry() {
        let card = test_card();
        assert_eq!((card.x, card.y), (10, 10));
        assert_eq!((card.width, card.height), (51, 81));
        assert_eq!(card.image.cols(), card.width);
        assert_eq!(card.image.rows(), card.height);
        assert!(card.identity.is_none());
        assert_eq!(card.confidence, 0.0);
    }

    #[test]
    fn test_crop_is_independent_of_frame() {
        let contour = Vector::from_iter([
            Point::new(0, 0),
            Point::new(40, 0),
            Point::new(40, 40),
            Point::new(0, 40),
        ]);
        let mut frame =
            Mat::new_rows_cols_with_default(60, 60, CV_8UC3, Scalar::all(200.0)).unwrap();
        let card = Card::from_contour(contour, &frame).unwrap();

        // Overwrite the frame, as the capture loop does between iterations.
        frame.set_to(&Scalar::all(0.0), &opencv::core::no_array()).unwrap();

        let px: &opencv::core::Vec3b = card.image.at_2d(5, 5).unwrap();
        assert_eq!(px[0], 200);
    }

    #[test]
    fn test_update_identity() {
        let mut card = test_card();
        card.update_identity(Some("AceOfSpades".to_string()), 0.42);
        assert_eq!(card.identity.as_deref(), Some("AceOfSpades"));
        assert_eq!(card.confidence, 0.42);
    }

    #[test]
    fn test_report_from_card() {
        let mut card = test_card();
        card.update_identity(Some("KingOfHearts".to_string()), 0.5);
        let report = CardReport::from(&card);
        assert_eq!(report.x, 10);
        assert_eq!(report.identity.as_deref(), Some("KingOfHearts"));
        assert_eq!(report.confidence, 0.5);
    }
}
