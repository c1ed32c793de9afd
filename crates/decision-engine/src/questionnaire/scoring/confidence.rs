use serde::{Deserialize, Serialize};

use super::risk::RiskReport;
use super::ScoreSet;

/// Answer count at which coverage stops adding confidence.
const FULL_COVERAGE_ANSWERS: f64 = 10.0;
const MAX_SPREAD_REDUCTION: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLabel {
    Low,
    Moderate,
    High,
}

impl ConfidenceLabel {
    fn from_score(score: u8) -> Self {
        if score >= 75 {
            ConfidenceLabel::High
        } else if score >= 50 {
            ConfidenceLabel::Moderate
        } else {
            ConfidenceLabel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub score: u8,
    pub label: ConfidenceLabel,
}

/// Stage 5: rate how much the recommendation can be trusted.
///
/// Coverage of the questionnaire drives most of the score; risk flags and warnings
/// subtract from it and a wide spread across categories trims it by up to 30%.
pub fn measure_confidence(
    answer_count: usize,
    scores: &ScoreSet,
    risk: &RiskReport,
) -> ConfidenceScore {
    let coverage = (answer_count as f64 / FULL_COVERAGE_ANSWERS).min(1.0);
    let flag_penalty = risk.flags.len() as f64 * 0.1 + risk.warnings.len() as f64 * 0.05;
    let spread_factor = 1.0 - (mean_absolute_deviation(scores) / 60.0).min(MAX_SPREAD_REDUCTION);

    let raw = coverage * 70.0 + spread_factor * 30.0 - flag_penalty * 30.0;
    let score = raw.clamp(0.0, 100.0).round() as u8;

    ConfidenceScore {
        score,
        label: ConfidenceLabel::from_score(score),
    }
}

fn mean_absolute_deviation(scores: &ScoreSet) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }

    let count = scores.len() as f64;
    let mean = scores.iter().map(|(_, score)| f64::from(score)).sum::<f64>() / count;
    scores
        .iter()
        .map(|(_, score)| (f64::from(score) - mean).abs())
        .sum::<f64>()
        / count
}
