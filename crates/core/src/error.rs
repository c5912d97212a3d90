//! Error types for Cue.
//!
//! This module defines a unified error enum shared by the detection engine,
//! its collaborators (LLM, OCR, prompts) and the CLI.

use thiserror::Error;

/// Unified error type for Cue.
///
/// Library functions return `Result<T, AppError>`. Only `UnsupportedInput`
/// and `ServiceUnavailable` ever surface from a detection call; the rest are
/// recovered inside the pipeline or reported by the collaborators themselves.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// OCR provider errors
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Detection input is neither text nor an image
    #[error("Unsupported input type: {0}")]
    UnsupportedInput(String),

    /// A collaborator required by the call is not configured
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
