//! Derives categorical flags and integer counters from canonicalized
//! answers and scoring-table side effects.
//!
//! Flag order is load-bearing: it feeds advisory ordering in the
//! explanation, so the set preserves insertion order and drops duplicates.

use std::collections::BTreeMap;

use super::super::domain::{AnswerSet, AnswerValue};
use super::config::{CounterSource, EngineConfig};
use super::scoring::ScoreSheet;

/// Ordered, deduplicated flag set.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FlagSet {
    ordered: Vec<String>,
}

impl FlagSet {
    pub(crate) fn insert(&mut self, flag: &str) {
        if !self.contains(flag) {
            self.ordered.push(flag.to_string());
        }
    }

    pub(crate) fn contains(&self, flag: &str) -> bool {
        self.ordered.iter().any(|existing| existing == flag)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub(crate) fn count_with_prefix(&self, prefix: &str) -> u32 {
        self.ordered
            .iter()
            .filter(|flag| flag.starts_with(prefix))
            .count() as u32
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

/// Number of informative entries in a list or matrix answer.
fn selection_count(answer: &AnswerValue) -> u32 {
    match answer {
        AnswerValue::List(items) => items.len() as u32,
        AnswerValue::Map(entries) => entries
            .values()
            .filter(|value| {
                matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "present" | "yes" | "true"
                )
            })
            .count() as u32,
        _ => 0,
    }
}

pub(crate) fn derive(
    answers: &AnswerSet,
    sheet: &ScoreSheet,
    config: &EngineConfig,
) -> (FlagSet, BTreeMap<String, u32>) {
    let mut flags = FlagSet::default();

    for flag in &sheet.matched_flags {
        flags.insert(flag);
    }

    for rule in &config.direct_flags {
        let Some(answer) = answers.get(&rule.question) else {
            continue;
        };
        let hit = match answer {
            AnswerValue::Scalar(value) => value == &rule.equals,
            AnswerValue::List(items) => items.iter().any(|item| item == &rule.equals),
            AnswerValue::Bool(value) => value.to_string() == rule.equals,
            AnswerValue::Map(_) => false,
        };
        if hit {
            flags.insert(&rule.flag);
        }
    }

    let mut counters = BTreeMap::new();
    for counter in &config.counters {
        let value = match &counter.source {
            CounterSource::FlagPrefix { prefix } => flags.count_with_prefix(prefix),
            CounterSource::ListLength { question } => answers
                .get(question)
                .map(selection_count)
                .unwrap_or(0),
        };
        counters.insert(counter.name.clone(), value);
    }

    (flags, counters)
}
