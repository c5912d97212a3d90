//! Command handlers for the cue CLI.

pub mod detect;
pub mod health;
pub mod session;

pub use detect::DetectCommand;
pub use health::HealthCommand;
pub use session::SessionCommand;

use anyhow::{bail, Context, Result};
use cue_core::AppConfig;
use cue_detect::{DetectOptions, DetectionResult, QuestionDetector};

/// Build a detector from configuration, optionally with AI enhancement off.
///
/// An unreachable AI provider only disables enhancement; see
/// [`QuestionDetector::from_config`].
pub(crate) fn build_detector(config: &AppConfig, no_ai: bool) -> Result<QuestionDetector> {
    let mut config = config.clone();
    if no_ai {
        config.detection.use_ai = false;
    }

    QuestionDetector::from_config(&config).context("Failed to build detector")
}

/// Resolve per-call options from flags and configuration.
pub(crate) fn detect_options(
    config: &AppConfig,
    no_ai: bool,
    threshold: Option<f64>,
) -> Result<DetectOptions> {
    let threshold = threshold.unwrap_or(config.detection.confidence_threshold);
    if !(0.0..=1.0).contains(&threshold) {
        bail!("confidence threshold must be within [0, 1], got {}", threshold);
    }

    let options = if no_ai || !config.detection.use_ai {
        DetectOptions::without_ai()
    } else {
        DetectOptions::default()
    };

    Ok(options.with_threshold(threshold))
}

/// Print a detection result as JSON or as a short human-readable summary.
pub(crate) fn print_result(result: &DetectionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if let Some(error) = &result.error {
        println!("error: {}", error);
        return Ok(());
    }

    if !result.success {
        println!("{} ({} ms)", result.detection_type, result.processing_time_ms);
        return Ok(());
    }

    println!(
        "{} [confidence {:.2}, {} ms]",
        result.detection_type, result.confidence, result.processing_time_ms
    );
    if let Some(question) = &result.question {
        println!("{}", question);
    }
    if let Some(code) = &result.code {
        println!("{}", code);
    }

    Ok(())
}
