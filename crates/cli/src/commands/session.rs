//! Session command handler.
//!
//! Reads stdin as a stream of text blocks separated by blank lines and runs
//! detection on each one with a single long-lived detector, so context and
//! statistics accumulate across blocks. Lines starting with `:` are session
//! commands.

use super::{build_detector, detect_options, print_result};
use anyhow::{Context, Result};
use clap::Args;
use cue_core::AppConfig;
use cue_detect::{DetectOptions, QuestionDetector};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Detect questions continuously from stdin
#[derive(Args, Debug)]
pub struct SessionCommand {
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

/// Control commands understood inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Control {
    Stats,
    Context,
    Reset,
    Health,
    Unknown(String),
}

impl Control {
    fn parse(line: &str) -> Self {
        match line.trim().trim_start_matches(':').to_lowercase().as_str() {
            "stats" => Control::Stats,
            "context" => Control::Context,
            "reset" => Control::Reset,
            "health" => Control::Health,
            other => Control::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionEvent {
    Block(String),
    Control(Control),
}

/// Groups input lines into blocks.
#[derive(Debug, Default)]
struct BlockReader {
    lines: Vec<String>,
}

impl BlockReader {
    fn push(&mut self, line: &str) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if line.trim().is_empty() {
            events.extend(self.flush());
        } else if line.trim_start().starts_with(':') {
            events.extend(self.flush());
            events.push(SessionEvent::Control(Control::parse(line)));
        } else {
            self.lines.push(line.to_string());
        }

        events
    }

    fn flush(&mut self) -> Option<SessionEvent> {
        if self.lines.is_empty() {
            return None;
        }

        let block = self.lines.join("\n");
        self.lines.clear();
        Some(SessionEvent::Block(block))
    }
}

impl SessionCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing session command");
        tracing::debug!("Session options: {:?}", self);

        let options = detect_options(config, self.no_ai, self.threshold)?;
        let detector = build_detector(config, self.no_ai)?;

        if !self.json {
            eprintln!(
                "cue session (ai: {}, ocr: {}, threshold: {:.2})",
                detector.has_ai(),
                detector.has_ocr(),
                options.confidence_threshold
            );
            eprintln!("Separate blocks with a blank line. Commands: :stats :context :reset :health");
        }

        let mut reader = BlockReader::default();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut blocks = 0usize;

        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            for event in reader.push(&line) {
                if matches!(event, SessionEvent::Block(_)) {
                    blocks += 1;
                }
                self.handle(&detector, &options, event).await?;
            }
        }

        if let Some(event) = reader.flush() {
            blocks += 1;
            self.handle(&detector, &options, event).await?;
        }

        tracing::info!("Session ended after {} blocks", blocks);
        Ok(())
    }

    async fn handle(
        &self,
        detector: &QuestionDetector,
        options: &DetectOptions,
        event: SessionEvent,
    ) -> Result<()> {
        match event {
            SessionEvent::Block(text) => {
                let result = detector.detect(text, options).await;
                print_result(&result, self.json)?;
            }
            SessionEvent::Control(Control::Stats) => {
                let stats = detector.stats().await;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    println!(
                        "questions: {}, detections: {}, avg confidence: {:.2}, accuracy: {:.2}, avg time: {:.1} ms",
                        stats.total_questions,
                        stats.successful_detections,
                        stats.average_confidence,
                        stats.classification_accuracy,
                        stats.processing_time_ms
                    );
                }
            }
            SessionEvent::Control(Control::Context) => {
                let context = detector.recent_context().await;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&context)?);
                } else if context.is_empty() {
                    println!("(no context)");
                } else {
                    for entry in context {
                        let types: Vec<&str> = entry.types.iter().map(String::as_str).collect();
                        println!(
                            "[{}] {} question(s) {}: {}",
                            entry.timestamp_ms,
                            entry.question_count,
                            types.join(","),
                            entry.text_snapshot.replace('\n', " ")
                        );
                    }
                }
            }
            SessionEvent::Control(Control::Reset) => {
                detector.reset_stats().await;
                detector.clear_context().await;
                println!("session reset");
            }
            SessionEvent::Control(Control::Health) => {
                let report = detector.health_check().await;
                super::health::print_report(&report, self.json)?;
            }
            SessionEvent::Control(Control::Unknown(name)) => {
                tracing::warn!("Unknown session command: :{}", name);
                eprintln!("unknown command :{} (try :stats :context :reset :health)", name);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(lines: &[&str]) -> Vec<SessionEvent> {
        let mut reader = BlockReader::default();
        let mut events: Vec<SessionEvent> = lines.iter().flat_map(|l| reader.push(l)).collect();
        events.extend(reader.flush());
        events
    }

    #[test]
    fn test_blocks_split_on_blank_lines() {
        let events = feed(&["What is Rust?", "", "", "Tell me about", "yourself."]);
        assert_eq!(
            events,
            vec![
                SessionEvent::Block("What is Rust?".to_string()),
                SessionEvent::Block("Tell me about\nyourself.".to_string()),
            ]
        );
    }

    #[test]
    fn test_control_flushes_pending_block() {
        let events = feed(&["Why this company?", ":stats", "  :Context  "]);
        assert_eq!(
            events,
            vec![
                SessionEvent::Block("Why this company?".to_string()),
                SessionEvent::Control(Control::Stats),
                SessionEvent::Control(Control::Context),
            ]
        );
    }

    #[test]
    fn test_unknown_control() {
        assert_eq!(Control::parse(":quit"), Control::Unknown("quit".to_string()));
        assert_eq!(Control::parse(":reset"), Control::Reset);
        assert_eq!(Control::parse(":health"), Control::Health);
    }

    #[test]
    fn test_empty_input_has_no_events() {
        assert!(feed(&[]).is_empty());
        assert!(feed(&["", "   "]).is_empty());
    }
}
