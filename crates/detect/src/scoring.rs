//! Raw confidence scoring from surface features.
//!
//! Scores start from a base value, add fixed bonuses per feature, and are
//! clamped to `[0, 1]`.

use crate::segment::{first_word, starts_with_imperative, INTERROGATIVES};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const QUESTION_BASE: f64 = 0.3;
const QUESTION_MARK_BONUS: f64 = 0.4;
const INTERROGATIVE_BONUS: f64 = 0.3;
const IMPERATIVE_BONUS: f64 = 0.2;
const LENGTH_ADJUSTMENT: f64 = 0.1;

/// Interrogatives that earn the opener bonus.
const SCORED_INTERROGATIVES: usize = 7;

const CODE_BASE: f64 = 0.4;
const FENCE_BONUS: f64 = 0.5;
const KEYWORD_STEP: f64 = 0.05;
const KEYWORD_CAP: f64 = 0.3;
const SYNTAX_STEP: f64 = 0.03;
const SYNTAX_CAP: f64 = 0.2;
const LINE_BONUS: f64 = 0.1;

/// Characters counted once each toward the syntax bonus.
const SYNTAX_CHARS: &[char] = &['{', '}', '(', ')', ';', '=', '[', ']'];

static CODE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:function|class|import|const|def|return|if|for|while)\b")
        .expect("valid code keyword regex")
});

/// Score a cleaned question candidate.
pub fn question_confidence(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let length = text.chars().count();
    let mut score = QUESTION_BASE;

    if text.trim_end().ends_with('?') {
        score += QUESTION_MARK_BONUS;
    }

    if INTERROGATIVES[..SCORED_INTERROGATIVES].contains(&first_word(&lower)) {
        score += INTERROGATIVE_BONUS;
    }

    if starts_with_imperative(&lower) {
        score += IMPERATIVE_BONUS;
    }

    if length < 20 {
        score -= LENGTH_ADJUSTMENT;
    }
    if length > 100 {
        score += LENGTH_ADJUSTMENT;
    }
    if length > 200 {
        score -= LENGTH_ADJUSTMENT;
    }

    score.clamp(0.0, 1.0)
}

/// Whether a snippet is wrapped in triple-backtick fences.
pub fn is_fenced(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() >= 6 && trimmed.starts_with("```") && trimmed.ends_with("```")
}

/// Number of distinct syntax characters present.
pub fn distinct_syntax_chars(text: &str) -> usize {
    SYNTAX_CHARS.iter().filter(|c| text.contains(**c)).count()
}

/// Total number of syntax characters, repeats included.
pub fn syntax_char_count(text: &str) -> usize {
    text.chars().filter(|c| SYNTAX_CHARS.contains(c)).count()
}

/// Score an extracted code snippet.
pub fn code_confidence(text: &str) -> f64 {
    let mut score = CODE_BASE;

    if is_fenced(text) {
        score += FENCE_BONUS;
    }

    let keywords: HashSet<&str> = CODE_KEYWORD.find_iter(text).map(|m| m.as_str()).collect();
    score += (keywords.len() as f64 * KEYWORD_STEP).min(KEYWORD_CAP);

    score += (distinct_syntax_chars(text) as f64 * SYNTAX_STEP).min(SYNTAX_CAP);

    let lines = text.lines().count();
    if lines > 3 {
        score += LINE_BONUS;
    }
    if lines > 8 {
        score += LINE_BONUS;
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_imperative_without_question_mark() {
        let score =
            question_confidence("Tell me about a time you faced a conflict with a teammate.");
        assert!(approx(score, 0.5));
    }

    #[test]
    fn test_interrogative_question_caps_at_one() {
        let score = question_confidence("How would you implement a rate limiter for an API?");
        assert!(approx(score, 1.0));
    }

    #[test]
    fn test_short_text_penalty() {
        // 0.3 + 0.4 + 0.3 - 0.1
        assert!(approx(question_confidence("What is your name?"), 0.9));
    }

    #[test]
    fn test_long_text_bonus() {
        let text = format!("Is {} fine", "a ".repeat(60));
        assert!(approx(question_confidence(&text), 0.4));
    }

    #[test]
    fn test_very_long_text_loses_bonus() {
        // 207 chars: +0.1 for >100, -0.1 for >200
        let text = format!("Is {}fine", "a ".repeat(100));
        assert_eq!(text.chars().count(), 207);
        assert!(approx(question_confidence(&text), 0.3));
    }

    #[test]
    fn test_only_core_interrogatives_score() {
        // "whose" opens a question but earns no opener bonus
        assert!(approx(question_confidence("Whose idea was the rewrite"), 0.3));
    }

    #[test]
    fn test_code_confidence_fenced() {
        let code = "```js\nfunction add(a, b) {\n  return a - b;\n}\n```";
        assert!(approx(code_confidence(code), 1.0));
    }

    #[test]
    fn test_code_confidence_counts_distinct_features() {
        // keywords: return, if (0.1); syntax: ( ) ; (0.09)
        let code = "if (x) return 1;\nif (y) return 2;";
        assert!(approx(code_confidence(code), 0.59));
    }

    #[test]
    fn test_code_confidence_long_snippet() {
        let code = (0..10).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n");
        assert!(approx(code_confidence(&code), 0.6));
    }

    #[test]
    fn test_code_keyword_bonus_caps() {
        // nine distinct keywords would give 0.45; capped at 0.3
        let code = "import function class const def return if for while";
        assert!(approx(code_confidence(code), 0.7));
    }

    #[test]
    fn test_code_syntax_bonus_caps() {
        // eight distinct syntax chars would give 0.24; capped at 0.2
        let code = "{ } ( ) ; = [ ]";
        assert_eq!(distinct_syntax_chars(code), 8);
        assert!(approx(code_confidence(code), 0.6));
    }

    #[test]
    fn test_code_syntax_below_cap() {
        // six distinct chars: 0.18
        assert!(approx(code_confidence("{ } ( ) ; ="), 0.58));
    }

    #[test]
    fn test_syntax_char_count() {
        assert_eq!(syntax_char_count("f(a)(b);"), 5);
        assert_eq!(syntax_char_count("plain words"), 0);
    }

    #[test]
    fn test_is_fenced() {
        assert!(is_fenced("  ```\nx\n```  "));
        assert!(!is_fenced("```"));
        assert!(!is_fenced("x = 1"));
    }
}
