//! OCR collaborator used for image inputs.

use async_trait::async_trait;
use base64::Engine;
use cue_core::{AppError, AppResult};
use cue_llm::{LlmClient, LlmRequest};
use std::sync::Arc;

const TRANSCRIBE_PROMPT: &str = "Transcribe all text visible in this image exactly as written. \
Keep line breaks and the indentation of any code. \
Output only the transcribed text, with no commentary.";

/// Raw image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Base64 encoding of the image bytes.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Per-call OCR options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrOptions {
    /// Expected language hint (e.g. "en")
    pub language: Option<String>,
}

/// Text recognized in an image.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,

    /// Provider confidence in `[0, 1]`, when the provider reports one
    pub confidence: Option<f64>,

    pub provider: String,
}

/// Turns images into text.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Provider name for logging and result metadata.
    fn name(&self) -> &str;

    /// Recognize the text in an image.
    async fn perform_ocr(&self, image: &ImagePayload, options: &OcrOptions) -> AppResult<OcrOutput>;
}

/// OCR backed by a vision-capable LLM.
pub struct VisionOcr {
    client: Arc<dyn LlmClient>,
    model: String,
    name: String,
}

impl VisionOcr {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        let name = format!("{}-vision", client.provider_name());
        Self {
            client,
            model: model.into(),
            name,
        }
    }
}

#[async_trait]
impl OcrProvider for VisionOcr {
    fn name(&self) -> &str {
        &self.name
    }

    async fn perform_ocr(&self, image: &ImagePayload, options: &OcrOptions) -> AppResult<OcrOutput> {
        if image.data.is_empty() {
            return Err(AppError::Ocr("Image payload is empty".to_string()));
        }

        let prompt = match &options.language {
            Some(language) => format!("{} The text is in language '{}'.", TRANSCRIBE_PROMPT, language),
            None => TRANSCRIBE_PROMPT.to_string(),
        };

        tracing::debug!(
            provider = %self.name,
            mime = %image.mime_type,
            bytes = image.data.len(),
            "Running OCR"
        );

        let request = LlmRequest::new(prompt, &self.model)
            .with_temperature(0.0)
            .with_image(&image.mime_type, image.to_base64());

        let response = self
            .client
            .complete(&request)
            .await
            .map_err(|e| AppError::Ocr(format!("{} failed: {}", self.name, e)))?;

        Ok(OcrOutput {
            text: response.content.trim().to_string(),
            confidence: None,
            provider: self.name.clone(),
        })
    }
}
