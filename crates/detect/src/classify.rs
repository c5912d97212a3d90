//! Keyword-table question classification.
//!
//! Each category carries keywords (full weight) and indicators (half
//! weight). A category's score is the capped sum of its matches; the best
//! score wins and earlier categories win ties. Matching is substring-based
//! on the lowercased text.

use crate::types::{Classification, QuestionType};

/// Confidence reported when no category matches.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

const INDICATOR_FACTOR: f64 = 0.5;

/// One row of the category table.
#[derive(Debug)]
pub struct Category {
    pub question_type: QuestionType,
    pub weight: f64,
    pub keywords: &'static [&'static str],
    pub indicators: &'static [&'static str],
}

/// Category table in tie-break order.
pub const CATEGORIES: &[Category] = &[
    Category {
        question_type: QuestionType::Behavioral,
        weight: 0.8,
        keywords: &[
            "tell me about a time",
            "describe a time",
            "describe a situation",
            "give me an example",
            "give an example of",
            "walk me through a time",
            "a time when",
            "a time you",
            "how did you handle",
            "how would you handle",
            "what would you do if",
            "situation where",
            "conflict",
            "disagree",
            "mistake",
            "failure",
        ],
        indicators: &[
            "team",
            "colleague",
            "coworker",
            "manager",
            "stakeholder",
            "deadline",
            "pressure",
            "feedback",
            "challenge",
            "difficult",
            "lead",
            "handled",
            "learned",
            "situation",
        ],
    },
    Category {
        question_type: QuestionType::Technical,
        weight: 0.9,
        keywords: &[
            "algorithm",
            "data structure",
            "complexity",
            "big o",
            "implement",
            "system design",
            "design a system",
            "architecture",
            "database",
            "sql",
            "api",
            "code",
            "debug",
            "optimize",
            "scalab",
            "concurren",
            "thread",
            "cache",
            "rate limit",
            "microservice",
            "linked list",
            "binary tree",
            "hash map",
            "recursion",
        ],
        indicators: &[
            "performance",
            "memory",
            "latency",
            "server",
            "network",
            "framework",
            "library",
            "deploy",
            "test",
            "query",
            "function",
            "language",
            "runtime",
            "protocol",
        ],
    },
    Category {
        question_type: QuestionType::General,
        weight: 0.6,
        keywords: &[
            "what is",
            "what are",
            "what does",
            "how does",
            "how do",
            "explain",
            "define",
            "difference between",
            "meaning of",
            "what do you know about",
            "your opinion",
            "what do you think",
        ],
        indicators: &[
            "example",
            "concept",
            "understand",
            "purpose",
            "advantage",
            "compare",
            "versus",
        ],
    },
    Category {
        question_type: QuestionType::Company,
        weight: 0.7,
        keywords: &[
            "our company",
            "this company",
            "why do you want to work",
            "why do you want to join",
            "why us",
            "why should we hire",
            "this role",
            "this position",
            "our product",
            "our mission",
            "our culture",
            "about us",
            "work here",
        ],
        indicators: &[
            "company",
            "organization",
            "culture",
            "mission",
            "values",
            "industry",
            "competitor",
            "customer",
            "product",
            "business",
        ],
    },
    Category {
        question_type: QuestionType::Personal,
        weight: 0.7,
        keywords: &[
            "yourself",
            "strength",
            "weakness",
            "your name",
            "hobbies",
            "hobby",
            "motivates you",
            "passionate",
            "where do you see",
            "career goal",
            "free time",
            "proud of",
        ],
        indicators: &[
            "goal",
            "future",
            "personal",
            "interest",
            "enjoy",
            "prefer",
            "motivat",
            "background",
            "five years",
            "salary",
        ],
    },
];

/// Sub-category tagging rules: (category, [(trigger, tag)]).
pub const SUB_CATEGORY_RULES: &[(QuestionType, &[(&str, &str)])] = &[
    (
        QuestionType::Behavioral,
        &[
            ("conflict", "conflict_resolution"),
            ("disagree", "conflict_resolution"),
            ("leadership", "leadership"),
            ("lead", "leadership"),
            ("team", "teamwork"),
            ("collaborat", "teamwork"),
            ("challenge", "problem_solving"),
            ("difficult", "problem_solving"),
            ("mistake", "learning_from_failure"),
            ("fail", "learning_from_failure"),
            ("deadline", "time_management"),
            ("pressure", "time_management"),
        ],
    ),
    (
        QuestionType::Technical,
        &[
            ("algorithm", "algorithms"),
            ("complexity", "algorithms"),
            ("system", "system_design"),
            ("architecture", "system_design"),
            ("database", "database"),
            ("sql", "database"),
            ("code", "coding"),
            ("implement", "coding"),
            ("debug", "debugging"),
        ],
    ),
    (
        QuestionType::General,
        &[
            ("difference", "comparison"),
            ("compare", "comparison"),
            ("define", "definition"),
            ("meaning", "definition"),
        ],
    ),
    (
        QuestionType::Company,
        &[
            ("culture", "culture_fit"),
            ("values", "culture_fit"),
            ("product", "product_knowledge"),
            ("customer", "product_knowledge"),
            ("why do you want", "motivation"),
            ("why us", "motivation"),
        ],
    ),
    (
        QuestionType::Personal,
        &[
            ("strength", "strengths"),
            ("weakness", "weaknesses"),
            ("goal", "career_goals"),
            ("future", "career_goals"),
            ("hobby", "interests"),
            ("hobbies", "interests"),
            ("free time", "interests"),
        ],
    ),
];

/// Classify a question candidate against the category table.
pub fn classify_question(text: &str) -> Classification {
    let lower = text.to_lowercase();
    let mut best: Option<(QuestionType, f64, Vec<String>)> = None;

    for category in CATEGORIES {
        let (score, matched) = score_category(category, &lower);
        let is_better = match &best {
            None => score > 0.0,
            Some((_, best_score, _)) => score > *best_score,
        };

        if is_better {
            best = Some((category.question_type, score, matched));
        }
    }

    let (question_type, confidence, matched_keywords) =
        best.unwrap_or((QuestionType::General, FALLBACK_CONFIDENCE, Vec::new()));

    Classification {
        question_type,
        confidence,
        sub_categories: sub_categories(question_type, &lower),
        matched_keywords,
    }
}

/// Classification of `text` under a type chosen elsewhere (an AI verdict).
///
/// Keywords, sub-categories and confidence all come from that type's table
/// row; with no matches the confidence is [`FALLBACK_CONFIDENCE`].
pub fn classify_as(question_type: QuestionType, text: &str) -> Classification {
    let lower = text.to_lowercase();
    let (score, matched_keywords) = CATEGORIES
        .iter()
        .find(|category| category.question_type == question_type)
        .map(|category| score_category(category, &lower))
        .unwrap_or_default();

    Classification {
        question_type,
        confidence: if score > 0.0 { score } else { FALLBACK_CONFIDENCE },
        sub_categories: sub_categories(question_type, &lower),
        matched_keywords,
    }
}

/// Capped score and matched phrases of one category.
fn score_category(category: &Category, lower: &str) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut matched = Vec::new();

    for keyword in category.keywords {
        if lower.contains(keyword) {
            score += category.weight;
            matched.push(keyword.to_string());
        }
    }

    for indicator in category.indicators {
        if lower.contains(indicator) {
            score += category.weight * INDICATOR_FACTOR;
            matched.push(indicator.to_string());
        }
    }

    (f64::min(score, 1.0), matched)
}

/// Sub-category tags for a category, deduplicated in rule order.
pub fn sub_categories(question_type: QuestionType, lower: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    let rules = SUB_CATEGORY_RULES
        .iter()
        .find(|(t, _)| *t == question_type)
        .map(|(_, rules)| *rules)
        .unwrap_or(&[]);

    for (trigger, tag) in rules {
        if lower.contains(trigger) && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    tags
}
