use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::super::domain::CareTier;
use super::expr;

/// A named scoring bucket with its weight and optional cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDef {
    pub id: String,
    pub weight: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<f32>,
}

/// Maps one (question, answer option) pair to a weighted domain
/// contribution and the flags the match emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRow {
    pub question: String,
    pub option: String,
    pub domain: String,
    pub points: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_override: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

/// Tier-adjustment semantics of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleEffect {
    Override {
        tier: CareTier,
    },
    Floor {
        min_tier: CareTier,
    },
    Modifier {
        delta: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_tier: Option<CareTier>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_tier: Option<CareTier>,
    },
}

/// One clinical rule: a condition over flags/counters plus its effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    pub id: String,
    pub when: String,
    #[serde(flatten)]
    pub effect: RuleEffect,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emit: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

/// Lower edge of a score band and the tier it maps to. Bands are
/// contiguous: each band ends where the next begins, the last is
/// open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    pub lower: f32,
    pub tier: CareTier,
}

/// Answer-based flag independent of any point value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectFlagRule {
    pub question: String,
    pub equals: String,
    pub flag: String,
}

/// How a counter accumulates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CounterSource {
    FlagPrefix { prefix: String },
    ListLength { question: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterDef {
    pub name: String,
    #[serde(flatten)]
    pub source: CounterSource,
}

/// Explanatory text attached to a flag for the advisory list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagAdvisory {
    pub flag: String,
    pub text: String,
}

fn default_fallback_weight() -> f32 {
    0.5
}

fn default_max_drivers() -> usize {
    5
}

/// The immutable table set the engine evaluates against.
///
/// Loaded once at startup and shared read-only across evaluations; a table
/// set that fails [`EngineConfig::validate`] must never reach the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub domains: Vec<DomainDef>,
    pub scoring: Vec<ScoringRow>,
    #[serde(default)]
    pub direct_flags: Vec<DirectFlagRule>,
    #[serde(default)]
    pub counters: Vec<CounterDef>,
    pub rules: Vec<RuleDef>,
    pub rule_order: Vec<String>,
    pub tier_bands: Vec<TierBand>,
    #[serde(default)]
    pub advisories: Vec<FlagAdvisory>,
    pub critical_questions: Vec<String>,
    #[serde(default = "default_fallback_weight")]
    pub fallback_weight: f32,
    #[serde(default = "default_max_drivers")]
    pub max_drivers: usize,
}

impl EngineConfig {
    /// Parses and validates a table set from JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, EngineSetupError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, EngineSetupError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Structural invariants that make scoring meaningful. Any violation is
    /// fatal: the engine refuses to initialize rather than degrade.
    pub fn validate(&self) -> Result<(), EngineSetupError> {
        if self.domains.is_empty() {
            return Err(EngineSetupError::NoDomains);
        }
        for (index, domain) in self.domains.iter().enumerate() {
            if self.domains[..index].iter().any(|d| d.id == domain.id) {
                return Err(EngineSetupError::DuplicateDomain(domain.id.clone()));
            }
            if !domain.weight.is_finite() || domain.weight < 0.0 {
                return Err(EngineSetupError::InvalidWeight {
                    id: domain.id.clone(),
                });
            }
            if let Some(cap) = domain.cap {
                if !cap.is_finite() || cap < 0.0 {
                    return Err(EngineSetupError::InvalidCap {
                        id: domain.id.clone(),
                    });
                }
            }
        }

        for row in &self.scoring {
            if self.domain(&row.domain).is_none() {
                return Err(EngineSetupError::UnknownDomain {
                    question: row.question.clone(),
                    option: row.option.clone(),
                    domain: row.domain.clone(),
                });
            }
        }

        if self.tier_bands.is_empty() {
            return Err(EngineSetupError::NoBands);
        }
        let first = &self.tier_bands[0];
        if first.lower != 0.0 {
            return Err(EngineSetupError::BandsMustStartAtZero(first.lower));
        }
        for pair in self.tier_bands.windows(2) {
            if pair[1].lower <= pair[0].lower {
                return Err(EngineSetupError::BandsNotIncreasing);
            }
            if pair[1].tier.rank() < pair[0].tier.rank() {
                return Err(EngineSetupError::BandsNotMonotone);
            }
        }

        for (index, id) in self.rule_order.iter().enumerate() {
            if self.rules.iter().all(|rule| &rule.id != id) {
                return Err(EngineSetupError::UnknownRule(id.clone()));
            }
            if self.rule_order[..index].contains(id) {
                return Err(EngineSetupError::DuplicateRuleOrder(id.clone()));
            }
        }
        for rule in &self.rules {
            if !self.rule_order.contains(&rule.id) {
                return Err(EngineSetupError::UnscheduledRule(rule.id.clone()));
            }
        }

        if self.critical_questions.is_empty() {
            return Err(EngineSetupError::NoCriticalQuestions);
        }
        if !self.fallback_weight.is_finite() || self.fallback_weight < 0.0 {
            return Err(EngineSetupError::InvalidFallbackWeight);
        }

        Ok(())
    }

    /// Offline lint pass for rule conditions. Malformed expressions are
    /// inert at evaluation time, so this is the place to surface them
    /// before deployment.
    pub fn lint_expressions(&self) -> Vec<(String, String)> {
        self.rules
            .iter()
            .filter_map(|rule| match expr::parse(&rule.when) {
                Ok(_) => None,
                Err(err) => Some((rule.id.clone(), err.to_string())),
            })
            .collect()
    }

    pub(crate) fn domain(&self, id: &str) -> Option<&DomainDef> {
        self.domains.iter().find(|domain| domain.id == id)
    }

    /// Band lookup: the last band whose lower edge is at or below the
    /// score. Negative totals clamp into the first band.
    pub(crate) fn band_index_for(&self, score: f32) -> usize {
        self.tier_bands
            .iter()
            .rposition(|band| band.lower <= score)
            .unwrap_or(0)
    }

    pub(crate) fn base_tier(&self, score: f32) -> CareTier {
        self.tier_bands[self.band_index_for(score)].tier
    }

    /// Lower and (if the band is not the open-ended top one) upper edge of
    /// the band containing the score.
    pub(crate) fn band_bounds(&self, score: f32) -> (f32, Option<f32>) {
        let index = self.band_index_for(score);
        let lower = self.tier_bands[index].lower;
        let upper = self.tier_bands.get(index + 1).map(|band| band.lower);
        (lower, upper)
    }

    pub(crate) fn ordered_rules(&self) -> impl Iterator<Item = &RuleDef> {
        self.rule_order
            .iter()
            .filter_map(|id| self.rules.iter().find(|rule| &rule.id == id))
    }

    pub(crate) fn advisory_for(&self, flag: &str) -> Option<&str> {
        self.advisories
            .iter()
            .find(|advisory| advisory.flag == flag)
            .map(|advisory| advisory.text.as_str())
    }

    /// Whether any scoring row knows this question at all.
    pub(crate) fn question_in_table(&self, question: &str) -> bool {
        self.scoring.iter().any(|row| row.question == question)
    }

    /// Domain that fallback contributions for this question land in.
    pub(crate) fn primary_domain_of(&self, question: &str) -> Option<&str> {
        self.scoring
            .iter()
            .find(|row| row.question == question)
            .map(|row| row.domain.as_str())
    }

    /// The built-in table set, consolidated from the two historical
    /// rubrics into the newer domain-weighted hybrid. Deployments override
    /// it with `APP_ENGINE_TABLES`.
    pub fn standard() -> Self {
        let domains = vec![
            DomainDef {
                id: "cognitive".into(),
                weight: 2.0,
                cap: Some(24.0),
            },
            DomainDef {
                id: "adl".into(),
                weight: 1.0,
                cap: Some(14.0),
            },
            DomainDef {
                id: "iadl".into(),
                weight: 0.5,
                cap: Some(4.0),
            },
            DomainDef {
                id: "mobility".into(),
                weight: 1.5,
                cap: Some(12.0),
            },
            DomainDef {
                id: "safety".into(),
                weight: 1.0,
                cap: Some(8.0),
            },
            DomainDef {
                id: "health".into(),
                weight: 1.0,
                cap: Some(8.0),
            },
            DomainDef {
                id: "support".into(),
                weight: 1.5,
                cap: Some(9.0),
            },
            DomainDef {
                id: "behavior".into(),
                weight: 1.5,
                cap: Some(12.0),
            },
        ];

        let mut scoring = vec![
            row("memory_changes", "none", "cognitive", 0.0, &[]),
            row("memory_changes", "occasional", "cognitive", 2.0, &[]),
            row(
                "memory_changes",
                "moderate",
                "cognitive",
                5.0,
                &["cog_moderate"],
            ),
            row(
                "memory_changes",
                "severe",
                "cognitive",
                10.0,
                &["cog_severe"],
            ),
        ];

        for (option, points) in [
            ("bathing", 2.0),
            ("dressing", 2.0),
            ("toileting", 3.0),
            ("transferring", 3.0),
            ("continence", 2.0),
            ("eating", 3.0),
        ] {
            scoring.push(row("badls", option, "adl", points, &[]));
        }

        for option in [
            "meals",
            "housekeeping",
            "medications",
            "finances",
            "transportation",
            "shopping",
        ] {
            let flags: &[&str] = if option == "medications" {
                &["iadl_medications"]
            } else {
                &[]
            };
            scoring.push(row("iadls", option, "iadl", 1.0, flags));
        }

        scoring.extend([
            row("mobility", "independent", "mobility", 0.0, &[]),
            row("mobility", "cane", "mobility", 1.0, &[]),
            row("mobility", "walker", "mobility", 3.0, &[]),
            row(
                "mobility",
                "wheelchair",
                "mobility",
                5.0,
                &["mobility_wheelchair"],
            ),
            row(
                "mobility",
                "bedbound",
                "mobility",
                8.0,
                &["mobility_bedbound"],
            ),
            row("falls", "none", "safety", 0.0, &[]),
            row("falls", "one", "safety", 2.0, &["falls_single"]),
            row("falls", "multiple", "safety", 5.0, &["falls_multiple"]),
            row(
                "primary_support",
                "live_in",
                "support",
                0.0,
                &["support_24h"],
            ),
            row("primary_support", "daily", "support", 1.0, &[]),
            row("primary_support", "weekly", "support", 2.0, &[]),
            row("primary_support", "occasional", "support", 3.0, &[]),
            row("primary_support", "none", "support", 5.0, &["no_support"]),
        ]);

        for (option, points) in [
            ("diabetes", 1.0),
            ("chf", 2.0),
            ("copd", 2.0),
            ("parkinsons", 2.0),
            ("stroke", 2.0),
        ] {
            let flag = format!("chronic_present_{option}");
            scoring.push(ScoringRow {
                question: "chronic_conditions".into(),
                option: option.into(),
                domain: "health".into(),
                points,
                weight_override: None,
                flags: vec![flag],
            });
        }

        for (option, points) in [
            ("wandering", 3.0),
            ("aggression", 3.0),
            ("sundowning", 2.0),
            ("exit_seeking", 3.0),
        ] {
            let flag = format!("behavior_{option}");
            scoring.push(ScoringRow {
                question: "behaviors".into(),
                option: option.into(),
                domain: "behavior".into(),
                points,
                weight_override: None,
                flags: vec![flag],
            });
        }

        let rules = vec![
            RuleDef {
                id: "fall-risk-floor".into(),
                when: "falls_multiple AND no_support".into(),
                effect: RuleEffect::Floor {
                    min_tier: CareTier::AssistedLiving,
                },
                emit: vec![],
                advisory: Some(
                    "Recurring falls without reliable in-home support; unsupervised living is unsafe."
                        .into(),
                ),
            },
            RuleDef {
                id: "adl-dependency-floor".into(),
                when: "badl_count >= 4".into(),
                effect: RuleEffect::Floor {
                    min_tier: CareTier::AssistedLiving,
                },
                emit: vec!["adl_dependent".into()],
                advisory: Some(
                    "Needs hands-on help with most basic activities of daily living.".into(),
                ),
            },
            RuleDef {
                id: "memory-care-floor".into(),
                when: "cog_severe".into(),
                effect: RuleEffect::Floor {
                    min_tier: CareTier::MemoryCare,
                },
                emit: vec![],
                advisory: Some(
                    "Severe cognitive decline calls for a secured memory-care setting.".into(),
                ),
            },
            RuleDef {
                id: "chronic-load-modifier".into(),
                when: "chronic_present >= 3 AND badl_count >= 2".into(),
                effect: RuleEffect::Modifier {
                    delta: 1,
                    min_tier: None,
                    max_tier: Some(CareTier::MemoryCare),
                },
                emit: vec!["chronic_load".into()],
                advisory: Some(
                    "Multiple chronic conditions compound the daily-care burden.".into(),
                ),
            },
            RuleDef {
                id: "behavior-escalation".into(),
                when: "behavior_count >= 2 AND (cog_moderate OR cog_severe)".into(),
                effect: RuleEffect::Modifier {
                    delta: 1,
                    min_tier: None,
                    max_tier: Some(CareTier::HighAcuityMemoryCare),
                },
                emit: vec!["behavior_compound".into()],
                advisory: Some(
                    "Behavioral symptoms alongside cognitive decline need specialized staffing."
                        .into(),
                ),
            },
            RuleDef {
                id: "high-acuity-override".into(),
                when: "cog_severe AND (no_support OR behavior_count >= 2)".into(),
                effect: RuleEffect::Override {
                    tier: CareTier::HighAcuityMemoryCare,
                },
                emit: vec!["high_acuity".into()],
                advisory: Some(
                    "Severe cognitive decline with no regular support in place; a high-acuity secured setting is recommended."
                        .into(),
                ),
            },
            RuleDef {
                id: "strong-support-relief".into(),
                when: "support_24h AND NOT cog_severe".into(),
                effect: RuleEffect::Modifier {
                    delta: -1,
                    min_tier: Some(CareTier::Independent),
                    max_tier: None,
                },
                emit: vec![],
                advisory: Some(
                    "Around-the-clock support is already in place and offsets part of the assessed need."
                        .into(),
                ),
            },
        ];

        let rule_order = rules.iter().map(|rule| rule.id.clone()).collect();

        Self {
            domains,
            scoring,
            direct_flags: vec![
                DirectFlagRule {
                    question: "primary_support".into(),
                    equals: "none".into(),
                    flag: "no_support".into(),
                },
                DirectFlagRule {
                    question: "primary_support".into(),
                    equals: "live_in".into(),
                    flag: "support_24h".into(),
                },
            ],
            counters: vec![
                CounterDef {
                    name: "badl_count".into(),
                    source: CounterSource::ListLength {
                        question: "badls".into(),
                    },
                },
                CounterDef {
                    name: "iadl_count".into(),
                    source: CounterSource::ListLength {
                        question: "iadls".into(),
                    },
                },
                CounterDef {
                    name: "behavior_count".into(),
                    source: CounterSource::ListLength {
                        question: "behaviors".into(),
                    },
                },
                CounterDef {
                    name: "chronic_present".into(),
                    source: CounterSource::FlagPrefix {
                        prefix: "chronic_present".into(),
                    },
                },
            ],
            rules,
            rule_order,
            tier_bands: vec![
                TierBand {
                    lower: 0.0,
                    tier: CareTier::Independent,
                },
                TierBand {
                    lower: 10.0,
                    tier: CareTier::InHomeSupport,
                },
                TierBand {
                    lower: 22.0,
                    tier: CareTier::AssistedLiving,
                },
                TierBand {
                    lower: 38.0,
                    tier: CareTier::MemoryCare,
                },
                TierBand {
                    lower: 55.0,
                    tier: CareTier::HighAcuityMemoryCare,
                },
            ],
            advisories: vec![
                FlagAdvisory {
                    flag: "no_support".into(),
                    text: "No regular caregiver support identified; in-home arrangements may not be sustainable.".into(),
                },
                FlagAdvisory {
                    flag: "cog_severe".into(),
                    text: "Reported memory changes are consistent with severe cognitive decline.".into(),
                },
                FlagAdvisory {
                    flag: "falls_multiple".into(),
                    text: "Multiple recent falls indicate a high ongoing fall risk.".into(),
                },
                FlagAdvisory {
                    flag: "mobility_bedbound".into(),
                    text: "Bedbound mobility status requires two-person transfer capability.".into(),
                },
                FlagAdvisory {
                    flag: "iadl_medications".into(),
                    text: "Medication management needs routine oversight.".into(),
                },
            ],
            critical_questions: vec![
                "memory_changes".into(),
                "badls".into(),
                "mobility".into(),
                "primary_support".into(),
            ],
            fallback_weight: default_fallback_weight(),
            max_drivers: default_max_drivers(),
        }
    }
}

fn row(question: &str, option: &str, domain: &str, points: f32, flags: &[&str]) -> ScoringRow {
    ScoringRow {
        question: question.into(),
        option: option.into(),
        domain: domain.into(),
        points,
        weight_override: None,
        flags: flags.iter().map(|flag| flag.to_string()).collect(),
    }
}

/// Fatal table problems. Any of these must prevent the engine from
/// becoming ready.
#[derive(Debug, thiserror::Error)]
pub enum EngineSetupError {
    #[error("engine tables unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine tables malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no scoring domains configured")]
    NoDomains,
    #[error("duplicate scoring domain '{0}'")]
    DuplicateDomain(String),
    #[error("domain '{id}' has a non-finite or negative weight")]
    InvalidWeight { id: String },
    #[error("domain '{id}' has a non-finite or negative cap")]
    InvalidCap { id: String },
    #[error("scoring row {question}/{option} references unknown domain '{domain}'")]
    UnknownDomain {
        question: String,
        option: String,
        domain: String,
    },
    #[error("no tier bands configured")]
    NoBands,
    #[error("tier bands must start at score zero (found {0})")]
    BandsMustStartAtZero(f32),
    #[error("tier band lower bounds must be strictly increasing")]
    BandsNotIncreasing,
    #[error("tier bands must not lower the tier as scores rise")]
    BandsNotMonotone,
    #[error("rule order references undefined rule '{0}'")]
    UnknownRule(String),
    #[error("rule '{0}' appears more than once in the evaluation order")]
    DuplicateRuleOrder(String),
    #[error("rule '{0}' is defined but never scheduled in the evaluation order")]
    UnscheduledRule(String),
    #[error("no critical questions configured")]
    NoCriticalQuestions,
    #[error("fallback weight must be finite and non-negative")]
    InvalidFallbackWeight,
}
