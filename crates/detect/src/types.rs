//! Domain types shared across the detection pipeline.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed question categories, in table order.
///
/// `General` doubles as the fallback when no category matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Behavioral,
    Technical,
    General,
    Company,
    Personal,
}

impl QuestionType {
    /// All categories in declaration order.
    pub const ALL: [QuestionType; 5] = [
        QuestionType::Behavioral,
        QuestionType::Technical,
        QuestionType::General,
        QuestionType::Company,
        QuestionType::Personal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Behavioral => "behavioral",
            QuestionType::Technical => "technical",
            QuestionType::General => "general",
            QuestionType::Company => "company",
            QuestionType::Personal => "personal",
        }
    }

    /// Parse a category name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subtype of an extracted code candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    CodeChallenge,
    AnsiblePlaybook,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::CodeChallenge => "code_challenge",
            CodeKind::AnsiblePlaybook => "ansible_playbook",
        }
    }
}

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    PatternMatching,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::PatternMatching => "pattern_matching",
        }
    }
}

/// A text span considered for question or code classification.
///
/// Candidates are created once by the segmenter or the code extractor and
/// only wrapped by later stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Cleaned text (list markers stripped, whitespace collapsed for questions)
    pub text: String,

    /// Text as it appeared in the input
    pub original_text: String,

    /// Byte offset of the span in the text it was extracted from
    pub position: usize,

    pub source: CandidateSource,

    /// Surface-feature score in `[0, 1]`
    pub raw_confidence: f64,
}

/// Result of scoring a question candidate against the category table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub confidence: f64,
    pub sub_categories: Vec<String>,
    pub matched_keywords: Vec<String>,
}

/// Difficulty tag supplied by AI enhancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// The `type` reported by a detection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionType {
    Question(QuestionType),
    Code(CodeKind),
    /// Text was present but nothing cleared the threshold
    GeneralText,
    /// Input yielded no text
    NoText,
    /// The call failed with a propagating error
    Error,
}

impl DetectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionType::Question(t) => t.as_str(),
            DetectionType::Code(k) => k.as_str(),
            DetectionType::GeneralText => "general_text",
            DetectionType::NoText => "no_text",
            DetectionType::Error => "error",
        }
    }
}

impl fmt::Display for DetectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DetectionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Per-call detection options.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectOptions {
    /// Run AI enhancement if an AI collaborator is configured
    pub use_ai: bool,

    /// Minimum combined confidence for a result to be reported
    pub confidence_threshold: f64,

    /// Model override for the enhancement call
    pub ai_model: Option<String>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            use_ai: true,
            confidence_threshold: 0.5,
            ai_model: None,
        }
    }
}

impl DetectOptions {
    /// Options with AI enhancement disabled.
    pub fn without_ai() -> Self {
        Self {
            use_ai: false,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.ai_model = Some(model.into());
        self
    }
}

/// Externally visible output of one detection call.
///
/// On success exactly one of `question` and `code` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub success: bool,
    pub question: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub detection_type: DetectionType,
    pub confidence: f64,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl DetectionResult {
    fn unsuccessful(
        detection_type: DetectionType,
        processing_time_ms: u64,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            question: None,
            code: None,
            detection_type,
            confidence: 0.0,
            processing_time_ms,
            error: None,
            metadata,
        }
    }

    /// Input produced no text.
    pub fn no_text(processing_time_ms: u64, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        Self::unsuccessful(DetectionType::NoText, processing_time_ms, metadata)
    }

    /// Text was present but nothing cleared the threshold.
    pub fn not_detected(
        processing_time_ms: u64,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self::unsuccessful(DetectionType::GeneralText, processing_time_ms, metadata)
    }

    /// The call failed with a propagating error.
    pub fn failure(error: impl fmt::Display, processing_time_ms: u64) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::unsuccessful(DetectionType::Error, processing_time_ms, BTreeMap::new())
        }
    }
}
