//! Confidence combination, thresholding and ranking.

use crate::classify::classify_question;
use crate::code::{classify_code, CodeClassification};
use crate::types::{Candidate, Classification, Difficulty, QuestionType};

/// Weight of the raw surface score in the combined confidence.
pub const RAW_WEIGHT: f64 = 0.4;

/// Weight of the classification score in the combined confidence.
pub const TYPE_WEIGHT: f64 = 0.6;

/// Weighted combination of raw and type confidence, clamped to `[0, 1]`.
pub fn combine_confidence(raw: f64, typed: f64) -> f64 {
    (raw * RAW_WEIGHT + typed * TYPE_WEIGHT).clamp(0.0, 1.0)
}

/// A question candidate with its classification and combined confidence.
///
/// `question_type`, `difficulty` and `corrected_text` start from the local
/// classification and may be overwritten by AI enhancement.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredQuestion {
    pub candidate: Candidate,
    pub classification: Classification,
    pub confidence: f64,
    pub question_type: QuestionType,
    pub corrected_text: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub reasoning: Option<String>,
    pub ai_enhanced: bool,
}

impl ScoredQuestion {
    /// Text reported for this question, preferring an AI correction.
    pub fn display_text(&self) -> &str {
        self.corrected_text
            .as_deref()
            .unwrap_or(&self.candidate.text)
    }
}

/// A code candidate with its classification and combined confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCode {
    pub candidate: Candidate,
    pub classification: CodeClassification,
    pub confidence: f64,
}

/// Classify a question candidate and combine its scores.
pub fn score_question(candidate: Candidate) -> ScoredQuestion {
    let classification = classify_question(&candidate.text);
    let confidence = combine_confidence(candidate.raw_confidence, classification.confidence);

    ScoredQuestion {
        question_type: classification.question_type,
        candidate,
        classification,
        confidence,
        corrected_text: None,
        difficulty: None,
        reasoning: None,
        ai_enhanced: false,
    }
}

/// Classify a code candidate and combine its scores.
pub fn score_code(candidate: Candidate) -> ScoredCode {
    let classification = classify_code(&candidate.text);
    let confidence = combine_confidence(candidate.raw_confidence, classification.confidence);

    ScoredCode {
        candidate,
        classification,
        confidence,
    }
}

/// Whether a combined confidence clears the threshold (inclusive).
pub fn passes_threshold(confidence: f64, threshold: f64) -> bool {
    confidence >= threshold
}

/// Questions that clear the threshold, in input order.
pub fn surviving<'a>(scored: &'a [ScoredQuestion], threshold: f64) -> Vec<&'a ScoredQuestion> {
    scored
        .iter()
        .filter(|q| passes_threshold(q.confidence, threshold))
        .collect()
}

/// Highest combined confidence; the earliest candidate wins ties.
pub fn select_best<'a>(questions: &[&'a ScoredQuestion]) -> Option<&'a ScoredQuestion> {
    let mut best: Option<&'a ScoredQuestion> = None;

    for question in questions {
        if best.map_or(true, |b| question.confidence > b.confidence) {
            best = Some(*question);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CandidateSource;

    fn candidate(text: &str, raw: f64, position: usize) -> Candidate {
        Candidate {
            text: text.to_string(),
            original_text: text.to_string(),
            position,
            source: CandidateSource::PatternMatching,
            raw_confidence: raw,
        }
    }

    #[test]
    fn test_combine_confidence() {
        assert!((combine_confidence(0.5, 1.0) - 0.8).abs() < 1e-9);
        assert!((combine_confidence(0.9, 0.7) - 0.78).abs() < 1e-9);
        assert_eq!(combine_confidence(1.0, 1.0), 1.0);
    }

    #[test]
    fn test_score_question_uses_classifier() {
        let scored = score_question(candidate("Tell me about a time you faced a conflict with a teammate.", 0.5, 0));
        assert_eq!(scored.question_type, QuestionType::Behavioral);
        assert!((scored.confidence - 0.8).abs() < 1e-9);
        assert!(!scored.ai_enhanced);
    }

    #[test]
    fn test_score_code_uses_fixed_type_confidence() {
        let scored = score_code(candidate("function f() {\n  return 1;\n}", 0.5, 0));
        assert!((scored.confidence - 0.74).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(passes_threshold(0.5, 0.5));
        assert!(!passes_threshold(0.49, 0.5));
    }

    #[test]
    fn test_select_best_prefers_earliest_on_tie() {
        let mut first = score_question(candidate("What is a mutex?", 0.9, 0));
        let mut second = score_question(candidate("What is a semaphore?", 0.9, 20));
        first.confidence = 0.8;
        second.confidence = 0.8;

        let scored = vec![first, second];
        let refs: Vec<&ScoredQuestion> = scored.iter().collect();
        assert_eq!(select_best(&refs).unwrap().candidate.position, 0);
    }

    #[test]
    fn test_surviving_filters_below_threshold() {
        let mut low = score_question(candidate("What is a mutex?", 0.9, 0));
        low.confidence = 0.3;
        let high = score_question(candidate("What is your name?", 0.9, 20));

        let scored = vec![low, high];
        let kept = surviving(&scored, 0.5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].candidate.position, 20);
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_display_text_prefers_correction() {
        let mut scored = score_question(candidate("Wat is a mutx?", 0.9, 0));
        assert_eq!(scored.display_text(), "Wat is a mutx?");
        scored.corrected_text = Some("What is a mutex?".to_string());
        assert_eq!(scored.display_text(), "What is a mutex?");
    }
}
