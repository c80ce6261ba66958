//! The care-level decision engine.
//!
//! A pure, synchronous function of (answers, tables): canonicalized
//! answers are scored into weighted domain totals, flags and counters are
//! derived, the ordered rule table moves the banded base tier to a final
//! tier, and the result is wrapped with confidence, drivers, and
//! advisories. No I/O, no shared mutable state; one `DecisionResult` per
//! call.

pub mod config;
mod explain;
mod expr;
mod flags;
mod rules;
mod scoring;

pub use config::{
    CounterDef, CounterSource, DirectFlagRule, DomainDef, EngineConfig, EngineSetupError,
    FlagAdvisory, RuleDef, RuleEffect, ScoringRow, TierBand,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::canonical::canonicalize;
use super::domain::{AnswerSet, CareTier};

/// Stateless evaluator over an immutable, validated table set. Safe to
/// share across concurrent evaluations.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    /// Validates the tables before accepting them; a broken table set
    /// never produces an engine.
    pub fn new(config: EngineConfig) -> Result<Self, EngineSetupError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluate(&self, answers: &AnswerSet) -> DecisionResult {
        if answers.is_empty() {
            return DecisionResult::no_data();
        }

        let canonical = canonicalize(answers);

        let missing: Vec<String> = self
            .config
            .critical_questions
            .iter()
            .filter(|question| {
                canonical
                    .get(question.as_str())
                    .map(|answer| answer.is_empty())
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            return DecisionResult::incomplete(missing);
        }

        let sheet = scoring::score(&canonical, &self.config);
        if sheet.unmatched_answers > 0 {
            tracing::debug!(
                unmatched = sheet.unmatched_answers,
                "evaluation saw answers the scoring table does not cover"
            );
        }

        let (mut flags, counters) = flags::derive(&canonical, &sheet, &self.config);
        let base_tier = self.config.base_tier(sheet.total);
        let outcome = rules::resolve(base_tier, &mut flags, &counters, &self.config);
        let explanation = explain::build(
            &canonical,
            &sheet,
            &flags,
            &outcome.advisories,
            &self.config,
        );

        DecisionResult {
            decision: CareDecision::Tier {
                tier: outcome.tier,
                base_tier,
            },
            total_score: sheet.total,
            domain_scores: sheet.domain_scores,
            flags: flags.into_vec(),
            advisories: explanation.advisories,
            drivers: explanation.drivers,
            triggered_rules: outcome.triggered,
            confidence: explanation.confidence,
            unmatched_answers: sheet.unmatched_answers,
        }
    }
}

/// What the engine concluded, including the two sentinel outcomes for
/// partially completed intakes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CareDecision {
    /// Nothing to work with: the answer map was empty.
    NoData,
    /// Critical questions are unanswered; no tier is asserted.
    Incomplete { missing: Vec<String> },
    /// A recommendation, with the pre-rule base tier kept for audits.
    Tier { tier: CareTier, base_tier: CareTier },
}

impl CareDecision {
    pub fn summary(&self) -> String {
        match self {
            CareDecision::NoData => "no intake answers provided yet".to_string(),
            CareDecision::Incomplete { missing } => {
                format!("awaiting critical intake answers: {}", missing.join(", "))
            }
            CareDecision::Tier { tier, .. } => {
                format!("recommended care level: {}", tier.display_name())
            }
        }
    }

    pub fn tier(&self) -> Option<CareTier> {
        match self {
            CareDecision::Tier { tier, .. } => Some(*tier),
            _ => None,
        }
    }
}

/// Top contributor to the final score, for user-facing explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub question: String,
    pub answer: String,
    pub domain: String,
    pub points: f32,
}

/// The engine's sole output. Created fresh per evaluation and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub decision: CareDecision,
    pub total_score: f32,
    pub domain_scores: BTreeMap<String, f32>,
    pub flags: Vec<String>,
    pub advisories: Vec<String>,
    pub drivers: Vec<Driver>,
    pub triggered_rules: Vec<String>,
    pub confidence: f32,
    pub unmatched_answers: u32,
}

impl DecisionResult {
    fn empty(decision: CareDecision) -> Self {
        Self {
            decision,
            total_score: 0.0,
            domain_scores: BTreeMap::new(),
            flags: Vec::new(),
            advisories: Vec::new(),
            drivers: Vec::new(),
            triggered_rules: Vec::new(),
            confidence: 0.0,
            unmatched_answers: 0,
        }
    }

    pub(crate) fn no_data() -> Self {
        let mut result = Self::empty(CareDecision::NoData);
        result
            .advisories
            .push("No intake answers were provided; complete the assessment to receive a recommendation.".to_string());
        result
    }

    pub(crate) fn incomplete(missing: Vec<String>) -> Self {
        let advisory = format!(
            "Assessment incomplete; still needed: {}.",
            missing.join(", ")
        );
        let mut result = Self::empty(CareDecision::Incomplete { missing });
        result.advisories.push(advisory);
        result
    }
}
