//! Health command handler.

use super::build_detector;
use anyhow::Result;
use clap::Args;
use cue_core::AppConfig;
use cue_detect::{HealthReport, HealthStatus};

/// Run the detector self-test and report configured services
#[derive(Args, Debug)]
pub struct HealthCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HealthCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing health command");

        let detector = build_detector(config, false)?;
        let report = detector.health_check().await;

        print_report(&report, self.json)
    }
}

pub(crate) fn print_report(report: &HealthReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let status = match report.status {
        HealthStatus::Healthy => "healthy",
        HealthStatus::Unhealthy => "unhealthy",
    };
    let enabled = |on: bool| if on { "enabled" } else { "disabled" };

    println!("status:    {}", status);
    println!("ai:        {}", enabled(report.services.ai));
    println!("ocr:       {}", enabled(report.services.ocr));
    println!(
        "self-test: {} ({:.2}, {} ms)",
        report.self_test_result.detection_type,
        report.self_test_result.confidence,
        report.self_test_result.processing_time_ms
    );
    println!(
        "session:   {} detections, {} questions",
        report.stats.successful_detections, report.stats.total_questions
    );

    Ok(())
}
