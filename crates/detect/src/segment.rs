//! Sentence segmentation and question candidate detection.

use crate::scoring::question_confidence;
use crate::text::collapse_whitespace;
use crate::types::{Candidate, CandidateSource};
use regex::Regex;
use std::sync::LazyLock;

/// Segments shorter than this (in chars) are discarded.
pub const MIN_SEGMENT_CHARS: usize = 10;

/// Segments of this length or longer are discarded.
pub const MAX_SEGMENT_CHARS: usize = 500;

/// Question words that open a question.
pub const INTERROGATIVES: &[&str] = &[
    "what", "how", "why", "when", "where", "who", "which", "whose", "whom",
];

/// Auxiliary verbs that open a yes/no question.
pub const AUXILIARIES: &[&str] = &[
    "can", "could", "would", "will", "should", "do", "does", "did", "is", "are", "was", "were",
];

/// Imperative openers used for interview prompts.
pub const IMPERATIVES: &[&str] = &[
    "tell me", "describe", "explain", "discuss", "give me", "walk me",
];

/// Numbering, bullets and "Question N:" prefixes.
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:q(?:uestion)?\s*)?\d{1,3}\s*[.):]|q(?:uestion)?\s*[.:]|\(\d{1,3}\)|[-*•·▪●◦>])\s*",
    )
    .expect("valid list marker regex")
});

/// A line that starts a new list item.
static LIST_ITEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:\d{1,3}[.)]|[-*•])[ \t]").expect("valid list item regex")
});

/// A raw span of the input between two boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<'a> {
    /// Byte offset of the trimmed span
    pub offset: usize,
    pub text: &'a str,
}

/// Split text into sentence-like segments.
///
/// Boundaries are `?`, a `.` or `!` followed by whitespace and an uppercase
/// letter, a blank line, and a line break before a list item. Runs of
/// terminal punctuation split once, after the last mark. The dot after a
/// bare list number does not split.
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let end = idx + c.len_utf8();
        let next = chars.peek().map(|&(_, n)| n);
        let punctuation_follows = matches!(next, Some('?' | '!' | '.'));

        let boundary = match c {
            '?' => !punctuation_follows,
            '.' | '!' => {
                !punctuation_follows
                    && followed_by_capital(&text[end..])
                    && !is_bare_number(&text[start..idx])
            }
            '\n' => starts_new_block(&text[end..]),
            _ => false,
        };

        if boundary {
            push_segment(&mut segments, text, start, end);
            start = end;
        }
    }

    push_segment(&mut segments, text, start, text.len());
    segments
}

fn push_segment<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str, start: usize, end: usize) {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }

    let leading = raw.len() - raw.trim_start().len();
    segments.push(Segment {
        offset: start + leading,
        text: trimmed,
    });
}

fn followed_by_capital(rest: &str) -> bool {
    let after_space = rest.trim_start();
    after_space.len() < rest.len()
        && after_space
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase())
}

fn is_bare_number(prefix: &str) -> bool {
    let prefix = prefix.trim();
    !prefix.is_empty() && prefix.len() <= 3 && prefix.chars().all(|c| c.is_ascii_digit())
}

fn starts_new_block(rest: &str) -> bool {
    rest.trim_start_matches([' ', '\t']).starts_with('\n') || LIST_ITEM_LINE.is_match(rest)
}

/// Strip a leading list marker and collapse whitespace.
pub fn clean_segment(segment: &str) -> String {
    let stripped = LIST_MARKER.replace(segment, "");
    collapse_whitespace(&stripped)
}

/// First alphanumeric word, lowercased input expected.
pub(crate) fn first_word(lower: &str) -> &str {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .unwrap_or("")
}

/// Whether `lower` opens with `phrase` as whole words.
pub(crate) fn starts_with_phrase(lower: &str, phrase: &str) -> bool {
    let body = lower.trim_start_matches(|c: char| !c.is_alphanumeric());
    body.strip_prefix(phrase)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric()))
}

pub(crate) fn starts_with_imperative(lower: &str) -> bool {
    IMPERATIVES
        .iter()
        .any(|phrase| starts_with_phrase(lower, phrase))
}

/// Whether a cleaned segment reads like a question or interview prompt.
pub fn is_question_like(text: &str) -> bool {
    if text.trim_end().ends_with('?') {
        return true;
    }

    let lower = text.to_lowercase();
    let word = first_word(&lower);

    INTERROGATIVES.contains(&word) || AUXILIARIES.contains(&word) || starts_with_imperative(&lower)
}

/// Segment text and keep the question-like segments as scored candidates.
///
/// Length limits apply to the trimmed segment before cleaning; the minimum
/// is checked again after list markers are stripped.
pub fn extract_question_candidates(text: &str) -> Vec<Candidate> {
    split_segments(text)
        .into_iter()
        .filter_map(|segment| {
            let length = segment.text.chars().count();
            if !(MIN_SEGMENT_CHARS..MAX_SEGMENT_CHARS).contains(&length) {
                return None;
            }

            let cleaned = clean_segment(segment.text);
            if cleaned.chars().count() < MIN_SEGMENT_CHARS || !is_question_like(&cleaned) {
                return None;
            }

            Some(Candidate {
                raw_confidence: question_confidence(&cleaned),
                text: cleaned,
                original_text: segment.text.to_string(),
                position: segment.offset,
                source: CandidateSource::PatternMatching,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<&str> {
        split_segments(text).into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_split_on_question_marks() {
        assert_eq!(
            texts("What is Rust? Why use it?"),
            vec!["What is Rust?", "Why use it?"]
        );
    }

    #[test]
    fn test_period_needs_capital_after() {
        assert_eq!(
            texts("We use v1.2 here. Next we talk. then continue"),
            vec!["We use v1.2 here.", "Next we talk. then continue"]
        );
    }

    #[test]
    fn test_split_on_blank_line() {
        assert_eq!(
            texts("first block of text\n\nsecond block"),
            vec!["first block of text", "second block"]
        );
    }

    #[test]
    fn test_numbered_list_items() {
        let segments = texts("1. What is a closure\n2. Explain ownership in Rust");
        assert_eq!(
            segments,
            vec!["1. What is a closure", "2. Explain ownership in Rust"]
        );
    }

    #[test]
    fn test_repeated_punctuation_splits_once() {
        assert_eq!(texts("Really?? Yes."), vec!["Really??", "Yes."]);
    }

    #[test]
    fn test_offsets_point_into_source() {
        let text = "Hello there.  What is your name?";
        let segments = split_segments(text);
        let last = segments.last().unwrap();
        assert_eq!(&text[last.offset..last.offset + last.text.len()], last.text);
    }

    #[test]
    fn test_clean_segment_strips_markers() {
        assert_eq!(clean_segment("Q3: What   is\nTCP?"), "What is TCP?");
        assert_eq!(clean_segment("- Describe your role"), "Describe your role");
        assert_eq!(clean_segment("(2) Why us?"), "Why us?");
        assert_eq!(clean_segment("Question 4) How fast?"), "How fast?");
    }

    #[test]
    fn test_question_like() {
        assert!(is_question_like("Tell me about yourself"));
        assert!(is_question_like("Describe a project you led"));
        assert!(is_question_like("Is this thread-safe"));
        assert!(is_question_like("You did what?"));
        assert!(!is_question_like("The weather is nice today"));
        assert!(!is_question_like("Telling stories is fun"));
    }

    #[test]
    fn test_extract_candidates_filters_length() {
        let long = format!("What is {}?", "x".repeat(600));
        let text = format!("Why? {} How do hash maps work?", long);
        let candidates = extract_question_candidates(&text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "How do hash maps work?");
        assert_eq!(candidates[0].source, CandidateSource::PatternMatching);
    }

    #[test]
    fn test_length_upper_bound_is_exclusive() {
        let just_under = format!("What is {}?", "x".repeat(490));
        assert_eq!(just_under.chars().count(), MAX_SEGMENT_CHARS - 1);
        assert_eq!(extract_question_candidates(&just_under).len(), 1);

        let at_limit = format!("What is {}?", "x".repeat(491));
        assert_eq!(at_limit.chars().count(), MAX_SEGMENT_CHARS);
        assert!(extract_question_candidates(&at_limit).is_empty());
    }

    #[test]
    fn test_minimum_rechecked_after_cleaning() {
        let candidates = extract_question_candidates("Question 12: Why?");
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_candidates_keep_original_text() {
        let candidates = extract_question_candidates("1. What is a mutex?");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "What is a mutex?");
        assert_eq!(candidates[0].original_text, "1. What is a mutex?");
        assert_eq!(candidates[0].position, 0);
    }
}
