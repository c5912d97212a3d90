//! In-crate test doubles for the AI and OCR collaborators.

use crate::ocr::{ImagePayload, OcrOptions, OcrOutput, OcrProvider};
use async_trait::async_trait;
use cue_core::{AppError, AppResult};
use cue_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

enum Reply {
    Content(String),
    Fail(String),
}

/// LLM client returning a canned reply and recording requests.
pub(crate) struct MockLlm {
    reply: Reply,
    delay: Option<Duration>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub(crate) fn replying(content: &str) -> Self {
        Self {
            reply: Reply::Content(content.to_string()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            reply: Reply::Fail(message.to_string()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Reply::Content(content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 10),
            }),
            Reply::Fail(message) => Err(AppError::Llm(message.clone())),
        }
    }
}

/// OCR provider returning fixed text.
pub(crate) struct MockOcr {
    result: Result<(String, Option<f64>), String>,
    calls: AtomicUsize,
}

impl MockOcr {
    pub(crate) fn returning(text: &str, confidence: Option<f64>) -> Self {
        Self {
            result: Ok((text.to_string(), confidence)),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrProvider for MockOcr {
    fn name(&self) -> &str {
        "mock-ocr"
    }

    async fn perform_ocr(&self, _image: &ImagePayload, _options: &OcrOptions) -> AppResult<OcrOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.result {
            Ok((text, confidence)) => Ok(OcrOutput {
                text: text.clone(),
                confidence: *confidence,
                provider: self.name().to_string(),
            }),
            Err(message) => Err(AppError::Ocr(message.clone())),
        }
    }
}
