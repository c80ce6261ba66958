//! Confidence scoring and the human-readable side of a decision.

use super::super::domain::AnswerSet;
use super::config::EngineConfig;
use super::flags::FlagSet;
use super::scoring::ScoreSheet;
use super::Driver;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Explanation {
    pub confidence: f32,
    pub drivers: Vec<Driver>,
    pub advisories: Vec<String>,
}

/// Fraction of critical questions carrying a non-empty answer.
pub(crate) fn completeness(answers: &AnswerSet, config: &EngineConfig) -> f32 {
    let total = config.critical_questions.len();
    if total == 0 {
        return 0.0;
    }
    let answered = config
        .critical_questions
        .iter()
        .filter(|question| {
            answers
                .get(question.as_str())
                .map(|answer| !answer.is_empty())
                .unwrap_or(false)
        })
        .count();
    answered as f32 / total as f32
}

/// Distance of the total from the nearest edge of its score band,
/// normalized so that the band midpoint reads as 1.0. The open-ended top
/// band borrows the previous band's half-width as its scale.
fn boundary_clarity(total: f32, config: &EngineConfig) -> f32 {
    let (lower, upper) = config.band_bounds(total);
    match upper {
        Some(upper) => {
            let half = (upper - lower) / 2.0;
            if half <= 0.0 {
                return 1.0;
            }
            let distance = (total - lower).min(upper - total).max(0.0);
            (distance / half).clamp(0.0, 1.0)
        }
        None => {
            let bands = &config.tier_bands;
            let half = if bands.len() >= 2 {
                (bands[bands.len() - 1].lower - bands[bands.len() - 2].lower) / 2.0
            } else {
                1.0
            };
            if half <= 0.0 {
                return 1.0;
            }
            ((total - lower) / half).clamp(0.0, 1.0)
        }
    }
}

pub(crate) fn build(
    answers: &AnswerSet,
    sheet: &ScoreSheet,
    flags: &FlagSet,
    rule_advisories: &[String],
    config: &EngineConfig,
) -> Explanation {
    let completeness = completeness(answers, config);
    let clarity = boundary_clarity(sheet.total, config);
    // Multiplicative blend: zero completeness pins confidence to zero, and
    // each signal can only move the score in its own direction.
    let confidence = (completeness * (0.5 + 0.5 * clarity)).clamp(0.0, 1.0);

    let mut drivers: Vec<Driver> = sheet
        .contributions
        .iter()
        .map(|contribution| Driver {
            question: contribution.question.clone(),
            answer: contribution.answer.clone(),
            domain: contribution.domain.clone(),
            points: contribution.points,
        })
        .collect();
    // Stable sort keeps scoring-table order for equal magnitudes.
    drivers.sort_by(|a, b| b.points.abs().total_cmp(&a.points.abs()));
    drivers.truncate(config.max_drivers);

    let mut advisories: Vec<String> = Vec::new();
    for flag in flags.iter() {
        if let Some(text) = config.advisory_for(flag) {
            if !advisories.iter().any(|existing| existing == text) {
                advisories.push(text.to_string());
            }
        }
    }
    for text in rule_advisories {
        if !advisories.iter().any(|existing| existing == text) {
            advisories.push(text.clone());
        }
    }

    Explanation {
        confidence,
        drivers,
        advisories,
    }
}
