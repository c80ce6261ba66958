use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// One answer as collected by the intake form layer.
///
/// The form layer evolves faster than the engine, so the value space is a
/// closed sum type rather than raw JSON: a scalar token, a multi-select
/// list, a yes/no, or a matrix of per-item values (e.g. one entry per
/// chronic condition). The engine never mutates answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Scalar(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl AnswerValue {
    pub fn scalar(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// An answer that carries no information counts as unanswered for
    /// completeness purposes.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Bool(_) => false,
            AnswerValue::Scalar(value) => value.trim().is_empty(),
            AnswerValue::List(values) => values.is_empty(),
            AnswerValue::Map(entries) => entries.is_empty(),
        }
    }
}

/// Answer map keyed by question id. `BTreeMap` keeps every walk over the
/// answers deterministic, which the byte-identical-result contract relies
/// on.
pub type AnswerSet = BTreeMap<String, AnswerValue>;

/// Raw intake snapshot handed over by the form/session layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    pub answers: AnswerSet,
    pub completed_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_source: Option<String>,
}

/// Ordered care-level classification produced by the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CareTier {
    Independent,
    InHomeSupport,
    AssistedLiving,
    MemoryCare,
    HighAcuityMemoryCare,
}

impl CareTier {
    pub const ALL: [CareTier; 5] = [
        CareTier::Independent,
        CareTier::InHomeSupport,
        CareTier::AssistedLiving,
        CareTier::MemoryCare,
        CareTier::HighAcuityMemoryCare,
    ];

    pub const fn rank(self) -> i32 {
        match self {
            CareTier::Independent => 0,
            CareTier::InHomeSupport => 1,
            CareTier::AssistedLiving => 2,
            CareTier::MemoryCare => 3,
            CareTier::HighAcuityMemoryCare => 4,
        }
    }

    /// Clamps into the valid tier range, so modifier arithmetic can never
    /// escape the scale.
    pub fn from_rank(rank: i32) -> Self {
        let clamped = rank.clamp(0, (Self::ALL.len() - 1) as i32);
        Self::ALL[clamped as usize]
    }

    pub const fn label(self) -> &'static str {
        match self {
            CareTier::Independent => "independent",
            CareTier::InHomeSupport => "in_home_support",
            CareTier::AssistedLiving => "assisted_living",
            CareTier::MemoryCare => "memory_care",
            CareTier::HighAcuityMemoryCare => "high_acuity_memory_care",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            CareTier::Independent => "Independent",
            CareTier::InHomeSupport => "In-Home Support",
            CareTier::AssistedLiving => "Assisted Living",
            CareTier::MemoryCare => "Memory Care",
            CareTier::HighAcuityMemoryCare => "High-Acuity Memory Care",
        }
    }
}

/// High level status tracked throughout the assessment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentStatus {
    Submitted,
    Evaluated,
    AwaitingInformation,
}

impl AssessmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssessmentStatus::Submitted => "submitted",
            AssessmentStatus::Evaluated => "evaluated",
            AssessmentStatus::AwaitingInformation => "awaiting_information",
        }
    }
}
