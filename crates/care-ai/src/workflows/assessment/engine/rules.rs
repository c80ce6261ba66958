//! Tier state machine: applies the ordered rule table to the base tier.
//!
//! Every rule is evaluated in the config-declared order with no early
//! exit; a later rule may undo an earlier one, and an override is a plain
//! assignment. Flags emitted by a triggered rule become visible to the
//! conditions of later rules, which is how escalation chains compose.

use std::collections::BTreeMap;

use super::super::domain::CareTier;
use super::config::{EngineConfig, RuleEffect};
use super::expr;
use super::flags::FlagSet;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RuleOutcome {
    pub tier: CareTier,
    pub triggered: Vec<String>,
    pub advisories: Vec<String>,
}

pub(crate) fn resolve(
    base: CareTier,
    flags: &mut FlagSet,
    counters: &BTreeMap<String, u32>,
    config: &EngineConfig,
) -> RuleOutcome {
    let mut rank = base.rank();
    let mut triggered = Vec::new();
    let mut advisories = Vec::new();

    for rule in config.ordered_rules() {
        if !expr::evaluate(&rule.when, flags, counters) {
            continue;
        }

        match &rule.effect {
            RuleEffect::Override { tier } => {
                rank = tier.rank();
            }
            RuleEffect::Floor { min_tier } => {
                rank = rank.max(min_tier.rank());
            }
            RuleEffect::Modifier {
                delta,
                min_tier,
                max_tier,
            } => {
                rank += delta;
                if let Some(min) = min_tier {
                    rank = rank.max(min.rank());
                }
                if let Some(max) = max_tier {
                    rank = rank.min(max.rank());
                }
            }
        }

        for flag in &rule.emit {
            flags.insert(flag);
        }
        if let Some(text) = &rule.advisory {
            advisories.push(text.clone());
        }
        triggered.push(rule.id.clone());
    }

    RuleOutcome {
        tier: CareTier::from_rank(rank),
        triggered,
        advisories,
    }
}
