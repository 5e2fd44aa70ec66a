//! Per-frame recognition pipeline: preprocess, detect, identify, report.

use super::config::RecognizerConfig;
use super::detector::CardDetector;
use crate::Result;
use crate::card::{Card, CardReport};
use crate::template::{CardMatcher, Template, TemplateLoader};
use crate::utils::image::preprocess_frame;
use anyhow::Context;
use log::debug;
use opencv::core::Mat;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// Everything produced for one frame.
#[derive(Debug)]
pub struct FrameResult {
    pub cards: Vec<Card>,
    pub stats: RecognitionStats,
}

/// Per-frame summary statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionStats {
    pub cards_detected: usize,
    pub cards_identified: usize,
    pub avg_confidence: f64,
    pub processing_time_ms: u64,
}

/// Serializable frame report for JSON export.
#[derive(Debug, Clone, Serialize)]
struct FrameReport {
    cards: Vec<CardReport>,
    stats: RecognitionStats,
}

/// The full pipeline: owns the template library, the shape classifier, and
/// the matcher. Templates are loaded once at construction and shared
/// read-only across every frame thereafter.
pub struct CardRecognizer {
    config: RecognizerConfig,
    templates: Vec<Template>,
    detector: CardDetector,
    matcher: CardMatcher,
}

impl CardRecognizer {
    /// Build a recognizer, loading templates from the configured directories.
    pub fn new(config: RecognizerConfig) -> Result<Self> {
        let mut loader = TemplateLoader::new().with_max_features(config.matcher.max_features);
        for dir in &config.template_dirs {
            loader = loader.add_template_dir(dir);
        }
        let templates = loader
            .load_all_templates()
            .context("failed to load template library")?;

        Ok(Self::with_templates(config, templates))
    }

    /// Build a recognizer around an already-loaded template library.
    pub fn with_templates(config: RecognizerConfig, templates: Vec<Template>) -> Self {
        let detector = CardDetector::new(config.detection.clone());
        let matcher = CardMatcher::new(config.matcher.clone());
        Self {
            config,
            templates,
            detector,
            matcher,
        }
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Run the pipeline on a color frame, including segmentation.
    pub fn process_frame(&self, frame: &Mat) -> Result<FrameResult> {
        let binary = preprocess_frame(frame)?;
        self.process_prepared(&binary, frame)
    }

    /// Run the pipeline on a caller-supplied binary mask and its color frame,
    /// for callers that do their own segmentation.
    pub fn process_prepared(&self, binary: &Mat, frame: &Mat) -> Result<FrameResult> {
        let start = Instant::now();

        let mut cards = self.detector.detect(binary, frame)?;
        for card in &mut cards {
            let outcome = self.matcher.identify(&card.image, &self.templates)?;
            card.update_identity(outcome.identity, outcome.score);
        }

        let stats = Self::summarize(&cards, start.elapsed().as_millis() as u64);
        debug!(
            "frame processed: {} detected, {} identified, {}ms",
            stats.cards_detected, stats.cards_identified, stats.processing_time_ms
        );

        Ok(FrameResult { cards, stats })
    }

    fn summarize(cards: &[Card], processing_time_ms: u64) -> RecognitionStats {
        let cards_identified = cards.iter().filter(|c| c.identity.is_some()).count();
        let avg_confidence = if cards.is_empty() {
            0.0
        } else {
            cards.iter().map(|c| c.confidence).sum::<f64>() / cards.len() as f64
        };

        RecognitionStats {
            cards_detected: cards.len(),
            cards_identified,
            avg_confidence,
            processing_time_ms,
        }
    }

    /// Draw recognition results onto a frame, honoring the visualization
    /// config.
    pub fn annotate(&self, frame: &mut Mat, cards: &[Card]) -> Result<()> {
        for card in cards {
            if self.config.visualization.draw_outlines {
                card.draw_outline(frame)?;
            }
            if self.config.visualization.draw_labels {
                card.draw_label(frame)?;
            }
        }
        Ok(())
    }

    /// Export a frame's results as pretty-printed JSON.
    pub fn export_json(&self, result: &FrameResult, output_path: &Path) -> Result<()> {
        let report = FrameReport {
            cards: result.cards.iter().map(CardReport::from).collect(),
            stats: result.stats.clone(),
        };
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialize frame report")?;
        std::fs::write(output_path, json)
            .with_context(|| format!("failed to write report to {:?}", output_path))?;
        Ok(())
    }
}
