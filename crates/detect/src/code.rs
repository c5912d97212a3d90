//! Code block extraction and code kind detection.

use crate::scoring::{code_confidence, distinct_syntax_chars, is_fenced, syntax_char_count};
use crate::types::{Candidate, CandidateSource, CodeKind};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Extracted snippets shorter than this (in chars) are ignored.
pub const MIN_CODE_CHARS: usize = 20;

/// Type confidence assigned to every code classification.
pub const CODE_TYPE_CONFIDENCE: f64 = 0.9;

/// Markers counted toward the Ansible playbook subtype.
const ANSIBLE_MARKERS: &[&str] = &[
    "hosts:",
    "tasks:",
    "become:",
    "handlers:",
    "gather_facts:",
    "ansible",
    "playbook",
    "- name:",
];

/// How many distinct markers make a snippet a playbook.
const ANSIBLE_MARKER_THRESHOLD: usize = 2;

/// Distinct syntax characters an unfenced keyword block must contain.
const MIN_KEYWORD_BLOCK_SYNTAX: usize = 3;

/// Block patterns tried against the raw text, in order.
static CODE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("fenced", r"(?s)```[^\n`]*\n.*?```"),
        (
            "keyword_block",
            r"(?m)^[^\n]*\b(?:function|class|import|const|def|return|if|for|while)\b[^\n]*(?:\n[^\n]*(?:[{}\[\];=]|\w\()[^\n]*)+",
        ),
        (
            "playbook",
            r"(?m)^[ \t]*(?:-[ \t]*)?hosts:[^\n]*(?:\n[^\n]*)*?\n[ \t]*tasks:[ \t]*(?:\n[ \t]+[^\n]*)+",
        ),
        (
            "dockerfile",
            r"(?m)(?:^[ \t]*(?:FROM|RUN|CMD|COPY|ADD|ENTRYPOINT|ENV|EXPOSE|WORKDIR|ARG|LABEL|USER|VOLUME)[ \t][^\n]*\n?){2,}",
        ),
        (
            "config",
            r"(?m)(?:^[ \t]*(?:\[[^\]\n]+\][ \t]*$|[A-Za-z_][\w.\-]*[ \t]*=[^\n]*)\n?){2,}",
        ),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid code block regex")))
    .collect()
});

static FENCE_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*```[ \t]*([\w+#.\-]+)").expect("valid fence language regex")
});

/// Language guessed for a code snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Java,
    Shell,
    Dockerfile,
    Yaml,
    Ini,
    Unknown,
}

impl CodeLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeLanguage::Rust => "rust",
            CodeLanguage::TypeScript => "typescript",
            CodeLanguage::JavaScript => "javascript",
            CodeLanguage::Python => "python",
            CodeLanguage::Go => "go",
            CodeLanguage::Java => "java",
            CodeLanguage::Shell => "shell",
            CodeLanguage::Dockerfile => "dockerfile",
            CodeLanguage::Yaml => "yaml",
            CodeLanguage::Ini => "ini",
            CodeLanguage::Unknown => "unknown",
        }
    }

    fn from_fence_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "rs" | "rust" => CodeLanguage::Rust,
            "ts" | "tsx" | "typescript" => CodeLanguage::TypeScript,
            "js" | "jsx" | "javascript" | "node" => CodeLanguage::JavaScript,
            "py" | "python" | "python3" => CodeLanguage::Python,
            "go" | "golang" => CodeLanguage::Go,
            "java" => CodeLanguage::Java,
            "sh" | "bash" | "shell" | "zsh" => CodeLanguage::Shell,
            "dockerfile" | "docker" => CodeLanguage::Dockerfile,
            "yml" | "yaml" | "ansible" => CodeLanguage::Yaml,
            "ini" | "toml" | "conf" | "cfg" => CodeLanguage::Ini,
            _ => CodeLanguage::Unknown,
        }
    }
}

/// Classification of the winning code candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeClassification {
    pub kind: CodeKind,
    pub confidence: f64,
    pub language: CodeLanguage,
}

/// Extract the best code block from raw text.
///
/// Every pattern match that is at least [`MIN_CODE_CHARS`] long and spans
/// more than one line is scored; the highest score wins and ties go to the
/// longer snippet, then to the earlier match. Unfenced keyword blocks must
/// also be dense in syntax characters, so prose that happens to contain
/// `for` and a semicolon is not taken for code.
pub fn extract_code_candidate(text: &str) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for (name, pattern) in CODE_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            let snippet = m.as_str().trim();
            if snippet.chars().count() < MIN_CODE_CHARS || !snippet.contains('\n') {
                continue;
            }
            if *name == "keyword_block" && !is_dense(snippet) {
                tracing::trace!("Keyword block rejected as prose");
                continue;
            }

            let score = code_confidence(snippet);
            tracing::trace!(pattern = name, score, "Code block match");

            if best.as_ref().map_or(true, |current| outranks(score, snippet, current)) {
                let leading = m.as_str().len() - m.as_str().trim_start().len();
                best = Some(Candidate {
                    text: snippet.to_string(),
                    original_text: snippet.to_string(),
                    position: m.start() + leading,
                    source: CandidateSource::PatternMatching,
                    raw_confidence: score,
                });
            }
        }
    }

    best
}

/// At least [`MIN_KEYWORD_BLOCK_SYNTAX`] distinct syntax characters and
/// on average one per line.
fn is_dense(snippet: &str) -> bool {
    distinct_syntax_chars(snippet) >= MIN_KEYWORD_BLOCK_SYNTAX
        && syntax_char_count(snippet) >= snippet.lines().count()
}

fn outranks(score: f64, snippet: &str, current: &Candidate) -> bool {
    score > current.raw_confidence
        || (score == current.raw_confidence && snippet.len() > current.text.len())
}

/// Decide the code subtype from playbook markers.
pub fn code_kind(text: &str) -> CodeKind {
    let lower = text.to_lowercase();
    let markers = ANSIBLE_MARKERS
        .iter()
        .filter(|marker| lower.contains(*marker))
        .count();

    if markers >= ANSIBLE_MARKER_THRESHOLD {
        CodeKind::AnsiblePlaybook
    } else {
        CodeKind::CodeChallenge
    }
}

/// Classify an extracted code snippet.
pub fn classify_code(text: &str) -> CodeClassification {
    let kind = code_kind(text);
    let language = match kind {
        CodeKind::AnsiblePlaybook => CodeLanguage::Yaml,
        CodeKind::CodeChallenge => detect_language(text),
    };

    CodeClassification {
        kind,
        confidence: CODE_TYPE_CONFIDENCE,
        language,
    }
}

/// Guess the snippet language, preferring a fence tag when present.
pub fn detect_language(text: &str) -> CodeLanguage {
    if is_fenced(text) {
        if let Some(caps) = FENCE_LANGUAGE.captures(text) {
            let tagged = CodeLanguage::from_fence_tag(&caps[1]);
            if tagged != CodeLanguage::Unknown {
                return tagged;
            }
        }
    }

    detect_language_from_content(text)
}

fn detect_language_from_content(text: &str) -> CodeLanguage {
    let directive_lines = text
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            ["FROM ", "RUN ", "CMD ", "COPY ", "ENTRYPOINT ", "WORKDIR "]
                .iter()
                .any(|d| line.starts_with(d))
        })
        .count();
    if directive_lines >= 2 && text.contains("FROM ") {
        return CodeLanguage::Dockerfile;
    }

    if text.contains("fn ")
        && (text.contains("impl ") || text.contains("let ") || text.contains("pub "))
    {
        return CodeLanguage::Rust;
    }

    if text.contains("public class ")
        || text.contains("System.out.")
        || text.contains("public static ")
    {
        return CodeLanguage::Java;
    }

    if text.contains("interface ") || text.contains(": string") || text.contains(": number") {
        return CodeLanguage::TypeScript;
    }

    if text.contains("function ")
        || text.contains("const ")
        || text.contains("=> ")
        || text.contains("console.log")
    {
        return CodeLanguage::JavaScript;
    }

    if text.contains("def ") || text.contains("elif ") || text.contains("print(") {
        return CodeLanguage::Python;
    }

    if text.contains("func ") || text.contains("package main") {
        return CodeLanguage::Go;
    }

    if text.starts_with("#!") || text.contains("echo ") || text.contains("fi\n") {
        return CodeLanguage::Shell;
    }

    let list_lines = text
        .lines()
        .filter(|l| l.trim_start().starts_with("- "))
        .count();
    if text.contains("hosts:") || list_lines >= 2 {
        return CodeLanguage::Yaml;
    }

    if text.lines().any(|l| {
        let l = l.trim();
        l.starts_with('[') && l.ends_with(']')
    }) || text.contains('=')
    {
        return CodeLanguage::Ini;
    }

    CodeLanguage::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYBOOK: &str = "- name: Install nginx\n  hosts: web\n  become: true\n  tasks:\n    - name: Install package\n      apt:\n        name: nginx";

    #[test]
    fn test_extracts_fenced_block() {
        let text = "Fix the bug in the following snippet:\n```javascript\nfunction add(a, b) {\n  return a - b;\n}\n```\nThanks.";
        let candidate = extract_code_candidate(text).unwrap();

        assert!(candidate.text.starts_with("```javascript"));
        assert!(candidate.text.ends_with("```"));
        assert_eq!(candidate.raw_confidence, 1.0);
        assert_eq!(&text[candidate.position..candidate.position + 3], "```");
    }

    #[test]
    fn test_extracts_unfenced_keyword_block() {
        let text = "Review this:\nfor (let i = 0; i < n; i++) {\n  total += items[i];\n}";
        let candidate = extract_code_candidate(text).unwrap();
        assert!(candidate.text.starts_with("for (let i"));
        assert!(candidate.text.ends_with('}'));
    }

    #[test]
    fn test_extracts_playbook() {
        let candidate = extract_code_candidate(PLAYBOOK).unwrap();
        assert!(candidate.text.contains("tasks:"));
        assert_eq!(code_kind(&candidate.text), CodeKind::AnsiblePlaybook);
    }

    #[test]
    fn test_extracts_dockerfile() {
        let text = "Our image:\nFROM rust:1.80\nWORKDIR /app\nRUN cargo build --release\n";
        let candidate = extract_code_candidate(text).unwrap();
        assert!(candidate.text.starts_with("FROM rust"));
        assert_eq!(detect_language(&candidate.text), CodeLanguage::Dockerfile);
    }

    #[test]
    fn test_extracts_config_block() {
        let text = "Settings:\n[server]\nport = 8080\nhost = localhost\n";
        let candidate = extract_code_candidate(text).unwrap();
        assert!(candidate.text.starts_with("[server]"));
        assert_eq!(detect_language(&candidate.text), CodeLanguage::Ini);
    }

    #[test]
    fn test_single_line_is_not_code() {
        assert!(extract_code_candidate("const x = compute(a, b);").is_none());
    }

    #[test]
    fn test_prose_is_not_code() {
        let text = "Tell me about a time you faced a conflict with a teammate.\nWhat did you learn (if anything)?";
        assert!(extract_code_candidate(text).is_none());
    }

    #[test]
    fn test_prose_with_semicolon_is_not_code() {
        let text = "Tell me about a time you worked for a startup.\nWhat went well; what went badly?";
        assert!(extract_code_candidate(text).is_none());
    }

    #[test]
    fn test_sparse_keyword_block_is_not_code() {
        // only `=` and `;` across three lines
        let text = "if the build is red\nwe set status = failed;\nand tell the team";
        assert!(extract_code_candidate(text).is_none());
    }

    #[test]
    fn test_tie_goes_to_longer_block() {
        // both blocks score 0.49: base plus `[`, `]` and `=`
        let text = "[server]\nport = 8080\nAlso this one:\n[database]\nhost = db.local\nport = 5432";
        let candidate = extract_code_candidate(text).unwrap();
        assert!(candidate.text.starts_with("[database]"));
        assert!((candidate.raw_confidence - 0.49).abs() < 1e-9);
    }

    #[test]
    fn test_outranks_prefers_score_then_length() {
        let current = Candidate {
            text: "abcdef".to_string(),
            original_text: "abcdef".to_string(),
            position: 0,
            source: CandidateSource::PatternMatching,
            raw_confidence: 0.5,
        };
        assert!(outranks(0.6, "ab", &current));
        assert!(outranks(0.5, "abcdefg", &current));
        assert!(!outranks(0.5, "abcdef", &current));
        assert!(!outranks(0.4, "abcdefghij", &current));
    }

    #[test]
    fn test_single_ansible_marker_is_code_challenge() {
        assert_eq!(code_kind("tasks: []\nprint(1)"), CodeKind::CodeChallenge);
    }

    #[test]
    fn test_classify_code() {
        let classification = classify_code(PLAYBOOK);
        assert_eq!(classification.kind, CodeKind::AnsiblePlaybook);
        assert_eq!(classification.language, CodeLanguage::Yaml);
        assert_eq!(classification.confidence, CODE_TYPE_CONFIDENCE);
    }

    #[test]
    fn test_detect_language_from_fence_tag() {
        assert_eq!(detect_language("```py\nx = 1\n```"), CodeLanguage::Python);
        assert_eq!(
            detect_language("```\nfn main() { let x = 1; }\n```"),
            CodeLanguage::Rust
        );
    }
}
