//! Detect command handler.
//!
//! Runs a single detection over inline text, stdin, or a file.

use super::{build_detector, detect_options, print_result};
use anyhow::{bail, Context, Result};
use clap::Args;
use cue_core::AppConfig;
use cue_detect::DetectionInput;
use std::io::Read;
use std::path::PathBuf;

/// Detect a question or code challenge in one piece of input
#[derive(Args, Debug)]
pub struct DetectCommand {
    /// Text to analyze (reads stdin when neither TEXT nor --file is given)
    pub text: Option<String>,

    /// Read input from a file (text or image)
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Skip AI enhancement even when a provider is configured
    #[arg(long)]
    pub no_ai: bool,

    /// Minimum confidence for a reported detection (default from config)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DetectCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing detect command");
        tracing::debug!("Detect options: {:?}", self);

        let options = detect_options(config, self.no_ai, self.threshold)?;
        let input = self.read_input()?;
        tracing::debug!("Input kind: {}", input.kind());

        let detector = build_detector(config, self.no_ai)?;
        let result = detector.detect(input, &options).await;

        print_result(&result, self.json)
    }

    fn read_input(&self) -> Result<DetectionInput> {
        if let Some(path) = &self.file {
            return DetectionInput::from_path(path)
                .with_context(|| format!("Failed to read input file {:?}", path));
        }

        if let Some(text) = &self.text {
            return Ok(DetectionInput::text(text.as_str()));
        }

        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        if buffer.trim().is_empty() {
            bail!("No input provided. Pass TEXT, --file, or pipe text on stdin");
        }

        Ok(DetectionInput::text(buffer))
    }
}
