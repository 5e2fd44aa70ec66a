use anyhow::Context;
use cardspotter_cv::{CardRecognizer, RecognizerConfig};
use cardspotter_cv::utils::ImageUtils;
use flexi_logger::Logger;
use log::info;
use std::path::PathBuf;

fn main() {
    let _logger = Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
        .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e));

    let mut args = std::env::args().skip(1);
    let frame_path = args
        .next()
        .unwrap_or_else(|| format!("{}/assets/frame.png", env!("CARGO_MANIFEST_DIR")));
    let template_dir = args
        .next()
        .unwrap_or_else(|| format!("{}/assets/templates", env!("CARGO_MANIFEST_DIR")));

    if let Err(e) = run(&frame_path, &template_dir) {
        eprintln!("Recognition failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(frame_path: &str, template_dir: &str) -> anyhow::Result<()> {
    let config = RecognizerConfig {
        template_dirs: vec![PathBuf::from(template_dir)],
        ..RecognizerConfig::default()
    };
    let output_dir = config.output_dir.clone();

    let recognizer = CardRecognizer::new(config)?;
    info!(
        "recognizer ready with {} templates",
        recognizer.templates().len()
    );

    let mut frame = ImageUtils::load_color(frame_path)
        .with_context(|| format!("failed to load frame: {}", frame_path))?;

    let result = recognizer.process_frame(&frame)?;

    println!(
        "Detected {} cards ({} identified, avg confidence {:.3}, {}ms):",
        result.stats.cards_detected,
        result.stats.cards_identified,
        result.stats.avg_confidence,
        result.stats.processing_time_ms
    );
    for card in &result.cards {
        println!(
            "  {} ({:.2}) at ({}, {}) {}x{}",
            card.identity.as_deref().unwrap_or("unknown"),
            card.confidence,
            card.x,
            card.y,
            card.width,
            card.height
        );
    }

    recognizer.annotate(&mut frame, &result.cards)?;

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create output directory {:?}", output_dir))?;
    let annotated_path = output_dir.join("annotated.png");
    ImageUtils::save_image(&frame, &annotated_path)?;
    recognizer.export_json(&result, &output_dir.join("report.json"))?;
    println!("Annotated frame saved: {:?}", annotated_path);

    Ok(())
}
