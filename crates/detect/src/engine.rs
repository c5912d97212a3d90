//! Detection orchestrator.
//!
//! [`QuestionDetector`] sequences the pipeline for one input:
//!
//! 1. Resolve text (OCR for images)
//! 2. Extract code from the raw text; a code block pre-empts questions
//! 3. Segment, detect and score question candidates
//! 4. Optionally enhance candidates with the AI collaborator
//! 5. Apply the confidence threshold and report the best candidate
//!
//! Successful detections update the session context and statistics.

use crate::code::extract_code_candidate;
use crate::combine::{
    passes_threshold, score_code, score_question, select_best, surviving, ScoredCode,
    ScoredQuestion,
};
use crate::enhance::{Enhancer, DEFAULT_AI_TIMEOUT};
use crate::input::DetectionInput;
use crate::ocr::{OcrOptions, OcrProvider, VisionOcr};
use crate::segment::extract_question_candidates;
use crate::text::{normalize_line_endings, normalize_text};
use crate::tracker::{ContextEntry, Observation, SessionTracker, Stats};
use crate::types::{DetectOptions, DetectionResult, DetectionType};
use chrono::Utc;
use cue_core::{AppConfig, AppError, AppResult};
use cue_llm::{create_client_with_timeout, LlmClient};
use cue_prompt::builtin::builtin_prompt;
use cue_prompt::{load_prompt, PromptDefinition, ENHANCE_PROMPT_ID};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::Instrument;

/// Input used by the health check self-test.
pub const SELF_TEST_TEXT: &str = "What is your name?";

type Metadata = BTreeMap<String, Value>;

/// Overall health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Which optional collaborators are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub ai: bool,
    pub ocr: bool,
}

/// Result of [`QuestionDetector::health_check`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub services: ServiceStatus,
    pub stats: Stats,
    pub self_test_result: DetectionResult,
}

/// Builder for [`QuestionDetector`].
#[derive(Default)]
pub struct DetectorBuilder {
    ai_client: Option<Arc<dyn LlmClient>>,
    ai_model: String,
    prompt: Option<PromptDefinition>,
    ai_timeout: Option<Duration>,
    ocr: Option<Arc<dyn OcrProvider>>,
    ocr_options: OcrOptions,
}

impl DetectorBuilder {
    /// Attach the AI collaborator used for enhancement.
    pub fn ai(mut self, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        self.ai_client = Some(client);
        self.ai_model = model.into();
        self
    }

    /// Use this enhancement prompt instead of the built-in one.
    pub fn prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn ai_timeout(mut self, timeout: Duration) -> Self {
        self.ai_timeout = Some(timeout);
        self
    }

    /// Attach the OCR collaborator used for image inputs.
    pub fn ocr(mut self, provider: Arc<dyn OcrProvider>) -> Self {
        self.ocr = Some(provider);
        self
    }

    pub fn ocr_options(mut self, options: OcrOptions) -> Self {
        self.ocr_options = options;
        self
    }

    pub fn build(self) -> AppResult<QuestionDetector> {
        let enhancer = match self.ai_client {
            Some(client) => {
                let prompt = match self.prompt {
                    Some(prompt) => prompt,
                    None => builtin_prompt(ENHANCE_PROMPT_ID)?.ok_or_else(|| {
                        AppError::Prompt(format!("Missing built-in prompt '{}'", ENHANCE_PROMPT_ID))
                    })?,
                };

                Some(
                    Enhancer::new(client, self.ai_model, prompt)
                        .with_timeout(self.ai_timeout.unwrap_or(DEFAULT_AI_TIMEOUT)),
                )
            }
            None => None,
        };

        Ok(QuestionDetector {
            enhancer,
            ocr: self.ocr,
            ocr_options: self.ocr_options,
            tracker: Mutex::new(SessionTracker::new()),
        })
    }
}

/// Public entry point of the detection pipeline.
///
/// One instance owns one session's context and statistics; concurrent
/// `detect` calls share them through an async mutex.
pub struct QuestionDetector {
    enhancer: Option<Enhancer>,
    ocr: Option<Arc<dyn OcrProvider>>,
    ocr_options: OcrOptions,
    tracker: Mutex<SessionTracker>,
}

impl Default for QuestionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionDetector {
    /// A detector with no AI or OCR collaborator.
    pub fn new() -> Self {
        Self {
            enhancer: None,
            ocr: None,
            ocr_options: OcrOptions::default(),
            tracker: Mutex::new(SessionTracker::new()),
        }
    }

    pub fn builder() -> DetectorBuilder {
        DetectorBuilder::default()
    }

    /// Wire collaborators from configuration.
    ///
    /// An AI provider that cannot be created disables enhancement with a
    /// warning; a misconfigured OCR provider is an error because image
    /// inputs would otherwise fail later.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let mut builder = Self::builder()
            .ai_timeout(Duration::from_secs(config.detection.ai_timeout_secs));

        if config.detection.use_ai {
            match connect(config, &config.provider) {
                Ok(client) => {
                    let prompt = load_prompt(&config.workspace, ENHANCE_PROMPT_ID)?;
                    builder = builder.ai(client, config.model.clone()).prompt(prompt);
                }
                Err(e) => tracing::warn!("AI enhancement disabled: {}", e),
            }
        }

        if config.ocr.enabled {
            let client = connect(config, &config.ocr.provider).map_err(AppError::Config)?;
            builder = builder.ocr(Arc::new(VisionOcr::new(client, config.ocr.model.clone())));
        }

        builder.build()
    }

    /// Whether an AI collaborator is configured.
    pub fn has_ai(&self) -> bool {
        self.enhancer.is_some()
    }

    /// Whether an OCR collaborator is configured.
    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Detect a question or code challenge in the input.
    ///
    /// Never fails: propagating errors are reported as a result with
    /// `success: false`, `type: "error"` and the error message.
    pub async fn detect(
        &self,
        input: impl Into<DetectionInput>,
        options: &DetectOptions,
    ) -> DetectionResult {
        let input = input.into();
        let started = Instant::now();
        let span = tracing::info_span!("detect", input = input.kind(), use_ai = options.use_ai);

        async move {
            match self.run(input, options, started, true).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(error = %e, "Detection failed");
                    DetectionResult::failure(e, elapsed_ms(started))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        input: DetectionInput,
        options: &DetectOptions,
        started: Instant,
        record: bool,
    ) -> AppResult<DetectionResult> {
        let mut metadata = Metadata::new();
        let text = self.resolve_text(input, &mut metadata).await?;

        if text.trim().is_empty() {
            tracing::debug!("No text to analyze");
            return Ok(DetectionResult::no_text(elapsed_ms(started), metadata));
        }

        let raw = normalize_line_endings(&text);
        if let Some(candidate) = extract_code_candidate(&raw) {
            let code = score_code(candidate);
            tracing::debug!(
                raw = code.candidate.raw_confidence,
                combined = code.confidence,
                kind = code.classification.kind.as_str(),
                "Code candidate"
            );
            return Ok(self
                .report_code(code, &raw, options, started, record, metadata)
                .await);
        }

        let normalized = normalize_text(&text);
        let candidates = extract_question_candidates(&normalized);
        tracing::debug!(candidates = candidates.len(), "Question candidates");

        let mut scored: Vec<ScoredQuestion> = candidates.into_iter().map(score_question).collect();
        for question in &scored {
            tracing::debug!(
                text = %question.candidate.text,
                raw = question.candidate.raw_confidence,
                typed = question.classification.confidence,
                combined = question.confidence,
                question_type = question.question_type.as_str(),
                "Scored candidate"
            );
        }

        if options.use_ai && !scored.is_empty() {
            if let Some(enhancer) = &self.enhancer {
                scored = enhancer
                    .enhance(&normalized, scored, options.ai_model.as_deref())
                    .await;
            }
        }

        metadata.insert("candidateCount".to_string(), json!(scored.len()));

        let kept = surviving(&scored, options.confidence_threshold);
        let Some(best) = select_best(&kept) else {
            tracing::info!(
                candidates = scored.len(),
                threshold = options.confidence_threshold,
                "No question cleared the threshold"
            );
            return Ok(DetectionResult::not_detected(elapsed_ms(started), metadata));
        };

        let processing_time_ms = elapsed_ms(started);
        if record {
            let batch: Vec<Observation<'_>> = kept
                .iter()
                .map(|q| Observation {
                    label: q.question_type.as_str(),
                    confidence: q.confidence,
                })
                .collect();
            self.tracker
                .lock()
                .await
                .record(&normalized, &batch, processing_time_ms, Utc::now());
        }

        tracing::info!(
            question_type = best.question_type.as_str(),
            confidence = best.confidence,
            "Question detected"
        );

        Ok(question_result(best, processing_time_ms, metadata))
    }

    async fn resolve_text(
        &self,
        input: DetectionInput,
        metadata: &mut Metadata,
    ) -> AppResult<String> {
        match input {
            DetectionInput::Text(text) => {
                metadata.insert("inputKind".to_string(), json!("text"));
                Ok(text)
            }
            DetectionInput::Image(image) => {
                let ocr = self.ocr.as_ref().ok_or_else(|| {
                    AppError::ServiceUnavailable("no OCR provider configured".to_string())
                })?;

                let output = ocr
                    .perform_ocr(&image, &self.ocr_options)
                    .await
                    .map_err(|e| {
                        tracing::warn!(provider = ocr.name(), error = %e, "OCR failed");
                        AppError::ServiceUnavailable(format!("OCR provider {}: {}", ocr.name(), e))
                    })?;

                tracing::debug!(provider = %output.provider, chars = output.text.len(), "OCR text");

                metadata.insert("inputKind".to_string(), json!("ocr"));
                metadata.insert("ocrProvider".to_string(), json!(output.provider));
                if let Some(confidence) = output.confidence {
                    metadata.insert("ocrConfidence".to_string(), json!(confidence));
                }

                Ok(output.text)
            }
            DetectionInput::Unsupported { mime_type } => {
                Err(AppError::UnsupportedInput(mime_type))
            }
        }
    }

    async fn report_code(
        &self,
        code: ScoredCode,
        raw_text: &str,
        options: &DetectOptions,
        started: Instant,
        record: bool,
        mut metadata: Metadata,
    ) -> DetectionResult {
        if !passes_threshold(code.confidence, options.confidence_threshold) {
            tracing::info!(
                confidence = code.confidence,
                threshold = options.confidence_threshold,
                "Code block below threshold"
            );
            return DetectionResult::not_detected(elapsed_ms(started), metadata);
        }

        let kind = code.classification.kind;
        let processing_time_ms = elapsed_ms(started);

        if record {
            let batch = [Observation {
                label: kind.as_str(),
                confidence: code.confidence,
            }];
            self.tracker
                .lock()
                .await
                .record(raw_text, &batch, processing_time_ms, Utc::now());
        }

        tracing::info!(kind = kind.as_str(), confidence = code.confidence, "Code detected");

        let candidate = code.candidate;
        metadata.insert("source".to_string(), json!(candidate.source.as_str()));
        metadata.insert("position".to_string(), json!(candidate.position));
        metadata.insert("rawConfidence".to_string(), json!(candidate.raw_confidence));
        metadata.insert(
            "typeConfidence".to_string(),
            json!(code.classification.confidence),
        );
        metadata.insert("codeKind".to_string(), json!(kind.as_str()));
        metadata.insert(
            "language".to_string(),
            json!(code.classification.language.as_str()),
        );
        metadata.insert("lineCount".to_string(), json!(candidate.text.lines().count()));

        DetectionResult {
            success: true,
            question: None,
            code: Some(candidate.text),
            detection_type: DetectionType::Code(kind),
            confidence: code.confidence,
            processing_time_ms,
            error: None,
            metadata,
        }
    }

    /// Statistics for this session.
    pub async fn stats(&self) -> Stats {
        self.tracker.lock().await.stats()
    }

    /// Up to five most recent successful detections, newest first.
    pub async fn recent_context(&self) -> Vec<ContextEntry> {
        self.tracker.lock().await.recent_context()
    }

    /// Number of context entries currently held.
    pub async fn context_len(&self) -> usize {
        self.tracker.lock().await.context_len()
    }

    /// Zero the statistics.
    pub async fn reset_stats(&self) {
        self.tracker.lock().await.reset_stats();
    }

    /// Forget the recent context.
    pub async fn clear_context(&self) {
        self.tracker.lock().await.clear_context();
    }

    /// Run a self-test detection (without AI or stats updates) and report
    /// which collaborators are configured.
    pub async fn health_check(&self) -> HealthReport {
        let started = Instant::now();
        let self_test_result = match self
            .run(
                DetectionInput::text(SELF_TEST_TEXT),
                &DetectOptions::without_ai(),
                started,
                false,
            )
            .await
        {
            Ok(result) => result,
            Err(e) => DetectionResult::failure(e, elapsed_ms(started)),
        };

        let status = if self_test_result.success {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        HealthReport {
            status,
            services: ServiceStatus {
                ai: self.has_ai(),
                ocr: self.has_ocr(),
            },
            stats: self.stats().await,
            self_test_result,
        }
    }
}

fn question_result(
    best: &ScoredQuestion,
    processing_time_ms: u64,
    mut metadata: Metadata,
) -> DetectionResult {
    let candidate = &best.candidate;
    let classification = &best.classification;

    metadata.insert("source".to_string(), json!(candidate.source.as_str()));
    metadata.insert("position".to_string(), json!(candidate.position));
    metadata.insert("originalText".to_string(), json!(candidate.original_text));
    metadata.insert("rawConfidence".to_string(), json!(candidate.raw_confidence));
    metadata.insert("typeConfidence".to_string(), json!(classification.confidence));
    metadata.insert("subCategories".to_string(), json!(classification.sub_categories));
    metadata.insert("matchedKeywords".to_string(), json!(classification.matched_keywords));
    metadata.insert("aiEnhanced".to_string(), json!(best.ai_enhanced));
    if let Some(difficulty) = best.difficulty {
        metadata.insert("difficulty".to_string(), json!(difficulty.as_str()));
    }
    if let Some(reasoning) = &best.reasoning {
        metadata.insert("reasoning".to_string(), json!(reasoning));
    }

    DetectionResult {
        success: true,
        question: Some(best.display_text().to_string()),
        code: None,
        detection_type: DetectionType::Question(best.question_type),
        confidence: best.confidence,
        processing_time_ms,
        error: None,
        metadata,
    }
}

fn connect(config: &AppConfig, provider: &str) -> Result<Arc<dyn LlmClient>, String> {
    let provider_config = config.get_provider_config(provider);
    let endpoint = provider_config.and_then(|p| p.endpoint());
    let timeout = provider_config.and_then(|p| p.timeout());
    let api_key = config.resolve_api_key(provider);
    create_client_with_timeout(provider, endpoint, api_key.as_deref(), timeout)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
