//! Normalizes raw form answers into the canonical tokens the scoring and
//! rule tables expect.
//!
//! Matching is an ordered substring scan per question, so free-form labels
//! like "severe diagnosis (Alzheimer's)" and the canonical token "severe"
//! land on the same value. Unknown questions and unrecognized values pass
//! through untouched; the scorer decides what to do with them.

use super::domain::{AnswerSet, AnswerValue};

struct KeywordRule {
    canonical: &'static str,
    keywords: &'static [&'static str],
}

// Order is load-bearing: "none" variants sit first wherever a later
// keyword ("one") is a substring of them.
const MEMORY_CHANGES: &[KeywordRule] = &[
    KeywordRule {
        canonical: "none",
        keywords: &["none", "no change", "no concern"],
    },
    KeywordRule {
        canonical: "severe",
        keywords: &["severe", "alzheim", "dementia", "diagnos"],
    },
    KeywordRule {
        canonical: "moderate",
        keywords: &["moderate"],
    },
    KeywordRule {
        canonical: "occasional",
        keywords: &["occasional", "mild", "sometimes", "forgets"],
    },
];

const PRIMARY_SUPPORT: &[KeywordRule] = &[
    KeywordRule {
        canonical: "none",
        keywords: &["none", "nobody", "no one", "no regular"],
    },
    KeywordRule {
        canonical: "live_in",
        keywords: &["live_in", "live-in", "live in", "24"],
    },
    KeywordRule {
        canonical: "daily",
        keywords: &["daily", "every day"],
    },
    KeywordRule {
        canonical: "weekly",
        keywords: &["weekly", "most weeks"],
    },
    KeywordRule {
        canonical: "occasional",
        keywords: &["occasional", "now and then"],
    },
];

const MOBILITY: &[KeywordRule] = &[
    KeywordRule {
        canonical: "independent",
        keywords: &["independent", "no aid", "unassisted"],
    },
    KeywordRule {
        canonical: "bedbound",
        keywords: &["bed"],
    },
    KeywordRule {
        canonical: "wheelchair",
        keywords: &["wheelchair"],
    },
    KeywordRule {
        canonical: "walker",
        keywords: &["walker"],
    },
    KeywordRule {
        canonical: "cane",
        keywords: &["cane"],
    },
];

const FALLS: &[KeywordRule] = &[
    KeywordRule {
        canonical: "none",
        keywords: &["none", "no falls"],
    },
    KeywordRule {
        canonical: "multiple",
        keywords: &["multiple", "several", "recurr", "more than"],
    },
    KeywordRule {
        canonical: "one",
        keywords: &["one", "once", "single"],
    },
];

const BADLS: &[KeywordRule] = &[
    KeywordRule {
        canonical: "bathing",
        keywords: &["bath"],
    },
    KeywordRule {
        canonical: "dressing",
        keywords: &["dress"],
    },
    KeywordRule {
        canonical: "toileting",
        keywords: &["toilet"],
    },
    KeywordRule {
        canonical: "transferring",
        keywords: &["transfer"],
    },
    KeywordRule {
        canonical: "continence",
        keywords: &["continen"],
    },
    KeywordRule {
        canonical: "eating",
        keywords: &["eat", "feed"],
    },
];

const IADLS: &[KeywordRule] = &[
    KeywordRule {
        canonical: "meals",
        keywords: &["meal", "cook"],
    },
    KeywordRule {
        canonical: "housekeeping",
        keywords: &["housekeep", "clean", "laundry"],
    },
    KeywordRule {
        canonical: "medications",
        keywords: &["medic"],
    },
    KeywordRule {
        canonical: "finances",
        keywords: &["financ", "bill"],
    },
    KeywordRule {
        canonical: "transportation",
        keywords: &["transport", "driv"],
    },
    KeywordRule {
        canonical: "shopping",
        keywords: &["shop", "errand"],
    },
];

const BEHAVIORS: &[KeywordRule] = &[
    KeywordRule {
        canonical: "wandering",
        keywords: &["wander"],
    },
    KeywordRule {
        canonical: "aggression",
        keywords: &["aggress", "combative"],
    },
    KeywordRule {
        canonical: "sundowning",
        keywords: &["sundown", "evening confusion"],
    },
    KeywordRule {
        canonical: "exit_seeking",
        keywords: &["exit", "elope"],
    },
];

fn rules_for(question: &str) -> Option<&'static [KeywordRule]> {
    match question {
        "memory_changes" => Some(MEMORY_CHANGES),
        "primary_support" => Some(PRIMARY_SUPPORT),
        "mobility" => Some(MOBILITY),
        "falls" => Some(FALLS),
        "badls" => Some(BADLS),
        "iadls" => Some(IADLS),
        "behaviors" => Some(BEHAVIORS),
        _ => None,
    }
}

fn canonical_token(rules: &[KeywordRule], raw: &str) -> String {
    let trimmed = raw.trim();

    // Already-canonical values map to themselves, which is what makes the
    // whole pass idempotent.
    if rules.iter().any(|rule| rule.canonical == trimmed) {
        return trimmed.to_string();
    }

    let lowered = trimmed.to_ascii_lowercase();
    for rule in rules {
        if rule
            .keywords
            .iter()
            .any(|keyword| lowered.contains(keyword))
        {
            return rule.canonical.to_string();
        }
    }

    raw.to_string()
}

/// Canonicalizes every known question's answer; unknown questions pass
/// through unchanged. Never fails.
pub(crate) fn canonicalize(answers: &AnswerSet) -> AnswerSet {
    answers
        .iter()
        .map(|(question, value)| {
            let canonical = match (rules_for(question), value) {
                (Some(rules), AnswerValue::Scalar(raw)) => {
                    AnswerValue::Scalar(canonical_token(rules, raw))
                }
                (Some(rules), AnswerValue::List(items)) => AnswerValue::List(
                    items
                        .iter()
                        .map(|item| canonical_token(rules, item))
                        .collect(),
                ),
                _ => value.clone(),
            };
            (question.clone(), canonical)
        })
        .collect()
}
