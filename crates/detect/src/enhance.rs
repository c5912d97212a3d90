//! AI enhancement of question candidates.
//!
//! The enhancer sends every scored question to the configured LLM in one
//! request and merges the verdicts back: the AI confidence is blended into
//! the combined confidence and the AI type, difficulty and corrected text
//! replace the local values. Any failure leaves the candidates untouched.

use crate::classify::classify_as;
use crate::combine::{combine_confidence, ScoredQuestion};
use crate::types::{Difficulty, QuestionType};
use cue_core::AppError;
use cue_llm::{LlmClient, LlmRequest};
use cue_prompt::{build_prompt, PromptDefinition};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;

/// Default upper bound for one enhancement request.
pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(8);

const MAX_RESPONSE_TOKENS: u32 = 1024;

/// Start of a numbered verdict in a free-form reply.
static ITEM_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:[#*>\-]+\s*)?(?:\*\*)?(?i:(?:candidate|question)\s*)?(\d{1,3})[.):]|(?i)^\s*"?index"?\s*:\s*(\d{1,3})"#)
        .expect("valid item marker regex")
});

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid decimal regex"));

/// Why an enhancement attempt produced nothing.
#[derive(Debug, Error)]
pub enum EnhancementError {
    #[error("AI request failed: {0}")]
    Llm(#[from] AppError),

    #[error("AI request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Could not parse AI response: {0}")]
    Parse(String),
}

/// One AI verdict, addressed by 1-based candidate index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enhancement {
    pub index: usize,
    pub confidence: Option<f64>,
    pub question_type: Option<QuestionType>,
    pub corrected_text: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub reasoning: Option<String>,
}

impl Enhancement {
    fn is_empty(&self) -> bool {
        self.confidence.is_none()
            && self.question_type.is_none()
            && self.corrected_text.is_none()
            && self.difficulty.is_none()
            && self.reasoning.is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnhancement {
    index: Option<usize>,
    confidence: Option<f64>,
    #[serde(rename = "type")]
    question_type: Option<String>,
    corrected_text: Option<String>,
    difficulty: Option<String>,
    reasoning: Option<String>,
}

/// AI collaborator bound to a model and the enhancement prompt.
pub struct Enhancer {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    timeout: Duration,
}

impl Enhancer {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
            timeout: DEFAULT_AI_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// Enhance scored questions, returning them unchanged on any failure.
    pub async fn enhance(
        &self,
        source_text: &str,
        questions: Vec<ScoredQuestion>,
        model: Option<&str>,
    ) -> Vec<ScoredQuestion> {
        if questions.is_empty() {
            return questions;
        }

        match self.request_enhancements(source_text, &questions, model).await {
            Ok(enhancements) => {
                tracing::debug!(
                    provider = self.provider_name(),
                    verdicts = enhancements.len(),
                    "Applying AI enhancements"
                );
                apply_enhancements(questions, &enhancements)
            }
            Err(e) => {
                tracing::warn!(provider = self.provider_name(), error = %e, "AI enhancement skipped");
                questions
            }
        }
    }

    /// Ask the LLM for verdicts on the given questions.
    pub async fn request_enhancements(
        &self,
        source_text: &str,
        questions: &[ScoredQuestion],
        model: Option<&str>,
    ) -> Result<Vec<Enhancement>, EnhancementError> {
        let candidates: Vec<_> = questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                json!({
                    "number": i + 1,
                    "text": q.display_text(),
                    "type": q.question_type.as_str(),
                    "confidence": format!("{:.2}", q.confidence),
                })
            })
            .collect();

        let built = build_prompt(
            &self.prompt,
            &json!({ "text": source_text, "candidates": candidates }),
        )?;

        let mut request = LlmRequest::new(built.user, model.unwrap_or(&self.model))
            .with_temperature(0.0)
            .with_max_tokens(MAX_RESPONSE_TOKENS);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = tokio::time::timeout(self.timeout, self.client.complete(&request))
            .await
            .map_err(|_| EnhancementError::Timeout(self.timeout))??;

        parse_enhancements(&response.content, questions.len())
    }
}

/// Parse verdicts from an LLM reply.
///
/// A JSON array is tried first; if it is missing, malformed, or has no
/// usable entry, the reply is scanned line by line for numbered items with
/// confidence, type and difficulty hints.
pub fn parse_enhancements(
    content: &str,
    candidate_count: usize,
) -> Result<Vec<Enhancement>, EnhancementError> {
    match parse_json_enhancements(content, candidate_count) {
        Ok(enhancements) if !enhancements.is_empty() => return Ok(enhancements),
        Ok(_) => tracing::debug!("AI JSON reply had no usable entries"),
        Err(e) => tracing::debug!(error = %e, "Falling back to line parsing"),
    }

    let enhancements = parse_line_enhancements(content, candidate_count);
    if enhancements.is_empty() {
        return Err(EnhancementError::Parse(
            "no candidate verdicts found".to_string(),
        ));
    }

    Ok(enhancements)
}

/// Slice from the first `[` to the last `]`.
fn extract_json_array(content: &str) -> Option<&str> {
    let start = content.find('[')?;
    let end = content.rfind(']')?;
    (end > start).then(|| &content[start..=end])
}

fn parse_json_enhancements(
    content: &str,
    candidate_count: usize,
) -> Result<Vec<Enhancement>, EnhancementError> {
    let json = extract_json_array(content)
        .ok_or_else(|| EnhancementError::Parse("no JSON array in reply".to_string()))?;

    let raw: Vec<RawEnhancement> =
        serde_json::from_str(json).map_err(|e| EnhancementError::Parse(e.to_string()))?;

    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let index = item.index.unwrap_or(position + 1);
            if index == 0 || index > candidate_count {
                return None;
            }

            let enhancement = Enhancement {
                index,
                confidence: item.confidence.and_then(normalize_ai_confidence),
                question_type: item.question_type.as_deref().and_then(QuestionType::parse),
                corrected_text: item.corrected_text.and_then(non_empty),
                difficulty: item.difficulty.as_deref().and_then(Difficulty::parse),
                reasoning: item.reasoning.and_then(non_empty),
            };

            (!enhancement.is_empty()).then_some(enhancement)
        })
        .collect())
}

fn parse_line_enhancements(content: &str, candidate_count: usize) -> Vec<Enhancement> {
    let mut enhancements = Vec::new();
    let mut current: Option<Enhancement> = None;

    for line in content.lines() {
        let mut rest = line;

        if let Some(caps) = ITEM_MARKER.captures(line) {
            let index = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse::<usize>().ok());

            if let Some(index) = index {
                enhancements.extend(current.take());
                current = Some(Enhancement {
                    index,
                    ..Enhancement::default()
                });
                rest = &line[caps.get(0).map_or(0, |m| m.end())..];
            }
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };

        let lower = rest.to_lowercase();

        if let Some(pos) = find_any(&lower, &["confidence", "score"]) {
            if let Some(value) = DECIMAL
                .find(&lower[pos..])
                .and_then(|m| m.as_str().parse::<f64>().ok())
            {
                entry.confidence = normalize_ai_confidence(value);
            }
        }

        if let Some(pos) = find_any(&lower, &["type", "classification", "category"]) {
            if let Some(question_type) = first_category(&lower[pos..]) {
                entry.question_type = Some(question_type);
            }
        }

        if let Some(pos) = lower.find("difficulty") {
            let tail = &lower[pos..];
            if let Some(difficulty) = ["easy", "medium", "hard"]
                .iter()
                .filter_map(|d| tail.find(d).map(|p| (p, *d)))
                .min_by_key(|(p, _)| *p)
                .and_then(|(_, d)| Difficulty::parse(d))
            {
                entry.difficulty = Some(difficulty);
            }
        }
    }

    enhancements.extend(current);
    enhancements.retain(|e| e.index >= 1 && e.index <= candidate_count && !e.is_empty());
    enhancements
}

fn find_any(haystack: &str, needles: &[&str]) -> Option<usize> {
    needles.iter().filter_map(|n| haystack.find(n)).min()
}

/// Earliest category name in the text.
fn first_category(text: &str) -> Option<QuestionType> {
    QuestionType::ALL
        .iter()
        .filter_map(|t| text.find(t.as_str()).map(|pos| (pos, *t)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, t)| t)
}

/// Percent-style values are scaled down, then clamped to `[0, 1]`.
fn normalize_ai_confidence(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let value = if value > 1.0 { value / 100.0 } else { value };
    Some(value.clamp(0.0, 1.0))
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Merge verdicts into the scored questions. Unknown indices are ignored.
pub fn apply_enhancements(
    mut questions: Vec<ScoredQuestion>,
    enhancements: &[Enhancement],
) -> Vec<ScoredQuestion> {
    for enhancement in enhancements {
        let Some(question) = enhancement
            .index
            .checked_sub(1)
            .and_then(|i| questions.get_mut(i))
        else {
            continue;
        };

        if let Some(ai_confidence) = enhancement.confidence {
            question.confidence = combine_confidence(question.confidence, ai_confidence);
        }
        if let Some(text) = &enhancement.corrected_text {
            question.corrected_text = Some(text.clone());
        }
        if let Some(question_type) = enhancement.question_type {
            question.question_type = question_type;
            if question_type != question.classification.question_type {
                question.classification = classify_as(question_type, question.display_text());
            }
        }
        if let Some(difficulty) = enhancement.difficulty {
            question.difficulty = Some(difficulty);
        }
        if let Some(reasoning) = &enhancement.reasoning {
            question.reasoning = Some(reasoning.clone());
        }
        question.ai_enhanced = true;
    }

    questions
}
