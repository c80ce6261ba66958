//! Walks canonicalized answers against the scoring table and accumulates
//! weighted per-domain totals.
//!
//! Matching is fail-soft: an answer no row recognizes contributes nothing
//! and is counted rather than rejected, so the intake form can evolve
//! ahead of the tables without breaking evaluations.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use super::super::domain::{AnswerSet, AnswerValue};
use super::config::EngineConfig;

/// One weighted, non-zero contribution, recorded in scoring-table order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Contribution {
    pub question: String,
    pub answer: String,
    pub domain: String,
    pub points: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ScoreSheet {
    pub domain_scores: BTreeMap<String, f32>,
    pub contributions: Vec<Contribution>,
    /// Flags declared on every matched row, in row order. Emission does not
    /// depend on the weighted contribution being non-zero.
    pub matched_flags: Vec<String>,
    pub total: f32,
    pub unmatched_answers: u32,
}

/// Matrix lookup: exact key first, then the suffix of a
/// delimiter-separated option label ("Chronic condition - chf" matches the
/// map key "chf").
fn matrix_value<'a>(entries: &'a BTreeMap<String, String>, option: &str) -> Option<&'a str> {
    if let Some(value) = entries.get(option) {
        return Some(value.as_str());
    }
    if let Some(suffix) = option.rsplit(" - ").next() {
        if suffix != option {
            return entries.get(suffix).map(String::as_str);
        }
    }
    None
}

/// Present/Absent semantics shared by matrix values and booleans.
fn reads_as_present(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "present" | "yes" | "true"
    )
}

fn bool_matches(option: &str, value: bool) -> bool {
    let wanted = option.trim().to_ascii_lowercase();
    match wanted.as_str() {
        "true" | "yes" | "present" => value,
        "false" | "no" | "absent" => !value,
        _ => false,
    }
}

fn display_value(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Bool(b) => b.to_string(),
        AnswerValue::Scalar(s) => s.clone(),
        AnswerValue::List(items) => items.join(", "),
        AnswerValue::Map(entries) => entries
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

pub(crate) fn score(answers: &AnswerSet, config: &EngineConfig) -> ScoreSheet {
    let mut sheet = ScoreSheet::default();
    for domain in &config.domains {
        sheet.domain_scores.insert(domain.id.clone(), 0.0);
    }

    // Questions for which at least one row resolved, including zero-point
    // and Absent matches; everything else feeds the unmatched path below.
    let mut matched_questions: BTreeSet<&str> = BTreeSet::new();

    for row in &config.scoring {
        let Some(answer) = answers.get(&row.question) else {
            continue;
        };

        let matched: Option<String> = match answer {
            AnswerValue::Scalar(value) => (value == &row.option).then(|| value.clone()),
            AnswerValue::Bool(value) => {
                bool_matches(&row.option, *value).then(|| value.to_string())
            }
            AnswerValue::List(items) => items
                .iter()
                .any(|item| item == &row.option)
                .then(|| row.option.clone()),
            AnswerValue::Map(entries) => match matrix_value(entries, &row.option) {
                Some(value) => {
                    matched_questions.insert(row.question.as_str());
                    reads_as_present(value).then(|| row.option.clone())
                }
                None => None,
            },
        };

        let Some(answer_label) = matched else {
            continue;
        };
        matched_questions.insert(row.question.as_str());

        let weight = row
            .weight_override
            .or_else(|| config.domain(&row.domain).map(|domain| domain.weight))
            .unwrap_or(0.0);
        let points = row.points * weight;

        for flag in &row.flags {
            sheet.matched_flags.push(flag.clone());
        }

        if points != 0.0 {
            *sheet.domain_scores.entry(row.domain.clone()).or_insert(0.0) += points;
            sheet.contributions.push(Contribution {
                question: row.question.clone(),
                answer: answer_label,
                domain: row.domain.clone(),
                points,
            });
        }
    }

    for (question, answer) in answers {
        if answer.is_empty() || matched_questions.contains(question.as_str()) {
            continue;
        }
        sheet.unmatched_answers += 1;

        if config.question_in_table(question) {
            // Valid question, novel option: score it with the fallback
            // weight instead of silently zeroing a real signal.
            if let Some(domain) = config.primary_domain_of(question) {
                let domain = domain.to_string();
                let points = config.fallback_weight;
                if points != 0.0 {
                    *sheet.domain_scores.entry(domain.clone()).or_insert(0.0) += points;
                    sheet.contributions.push(Contribution {
                        question: question.clone(),
                        answer: display_value(answer),
                        domain,
                        points,
                    });
                }
                tracing::debug!(%question, "novel answer option scored at fallback weight");
            }
        } else {
            tracing::debug!(%question, "answer for unknown question ignored");
        }
    }

    for domain in &config.domains {
        if let Some(cap) = domain.cap {
            if let Some(total) = sheet.domain_scores.get_mut(&domain.id) {
                *total = total.min(cap);
            }
        }
    }

    sheet.total = sheet.domain_scores.values().sum();
    sheet
}
