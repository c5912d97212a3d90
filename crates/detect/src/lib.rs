//! Interview question and code challenge detection for Cue.
//!
//! Given noisy text (typed, pasted, or recovered from a screenshot by an
//! OCR collaborator) the detector decides whether it contains an interview
//! question or a code/config challenge, classifies it, and reports a
//! confidence score. All scoring is deterministic and table-driven; an
//! optional AI collaborator can re-score and correct question candidates.
//!
//! # Example
//! ```no_run
//! use cue_detect::{DetectOptions, QuestionDetector};
//!
//! # async fn example() {
//! let detector = QuestionDetector::new();
//! let result = detector
//!     .detect("How would you implement a rate limiter for an API?", &DetectOptions::default())
//!     .await;
//! println!("{} ({:.2})", result.detection_type, result.confidence);
//! # }
//! ```

pub mod classify;
pub mod code;
pub mod combine;
pub mod engine;
pub mod enhance;
pub mod input;
pub mod ocr;
pub mod scoring;
pub mod segment;
pub mod text;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main types
pub use engine::{DetectorBuilder, HealthReport, HealthStatus, QuestionDetector, ServiceStatus};
pub use enhance::{EnhancementError, Enhancer};
pub use input::DetectionInput;
pub use ocr::{ImagePayload, OcrOptions, OcrOutput, OcrProvider, VisionOcr};
pub use tracker::{ContextEntry, Stats};
pub use types::{
    Candidate, Classification, CodeKind, DetectOptions, DetectionResult, DetectionType,
    Difficulty, QuestionType,
};
