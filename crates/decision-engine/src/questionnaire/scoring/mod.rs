//! Five-stage scoring pipeline turning a session's answers into a decision recommendation.
//!
//! Stages run in a fixed order and each consumes only what the previous ones produced:
//! raw accumulation, normalization, risk analysis, recommendation, confidence. The pipeline
//! performs no I/O and never fails; missing or malformed inputs are skipped or defaulted.

mod confidence;
mod normalize;
mod raw;
mod recommendation;
mod risk;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Answer, Category, SessionId};

pub use confidence::{measure_confidence, ConfidenceLabel, ConfidenceScore};
pub use normalize::normalize;
pub use raw::{accumulate, RawScores};
pub use recommendation::{recommend, Recommendation, Verdict};
pub use risk::{assess_risk, RiskFlag, RiskReport, RiskWarning, Severity};

/// Per-category scores on the 0–100 presentation scale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSet(BTreeMap<Category, u8>);

impl ScoreSet {
    pub fn get(&self, category: &Category) -> Option<u8> {
        self.0.get(category).copied()
    }

    pub fn get_or(&self, category: &Category, default: u8) -> u8 {
        self.get(category).unwrap_or(default)
    }

    pub fn insert(&mut self, category: Category, score: u8) {
        self.0.insert(category, score);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, u8)> {
        self.0.iter().map(|(category, score)| (category, *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Category, u8)> for ScoreSet {
    fn from_iter<T: IntoIterator<Item = (Category, u8)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Static weights and combinations steering normalization and risk analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub category_weights: BTreeMap<Category, f64>,
    pub critical_pairs: Vec<(Category, Category)>,
}

impl ScoringPolicy {
    pub const DEFAULT_CATEGORY_WEIGHT: f64 = 1.0;

    pub fn standard() -> Self {
        let category_weights = [
            (Category::Feasibility, 1.5),
            (Category::Risk, 2.0),
            (Category::Impact, 1.8),
            (Category::Resources, 1.3),
            (Category::Urgency, 1.0),
        ]
        .into_iter()
        .collect();

        Self {
            category_weights,
            critical_pairs: vec![
                (Category::Risk, Category::Resources),
                (Category::Risk, Category::Feasibility),
            ],
        }
    }

    pub fn category_weight(&self, category: &Category) -> f64 {
        self.category_weights
            .get(category)
            .copied()
            .unwrap_or(Self::DEFAULT_CATEGORY_WEIGHT)
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Metadata stamped onto a result alongside the computed scores.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub session_id: SessionId,
    pub decision_title: String,
    pub scored_at: DateTime<Utc>,
}

/// Aggregate output of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    pub session_id: SessionId,
    pub decision_title: String,
    pub total_answers: usize,
    pub scored_at: DateTime<Utc>,
    pub scores: ScoreSet,
    pub risk: RiskReport,
    pub recommendation: Recommendation,
    pub confidence: ConfidenceScore,
}

/// Run every stage over `answers`.
pub fn score(answers: &[Answer], context: ScoringContext, policy: &ScoringPolicy) -> ScoredResult {
    let raw = accumulate(answers);
    let scores = normalize(&raw, policy);
    let risk = assess_risk(&scores, policy);
    let recommendation = recommend(&scores, &risk);
    let confidence = measure_confidence(answers.len(), &scores, &risk);

    ScoredResult {
        session_id: context.session_id,
        decision_title: context.decision_title,
        total_answers: answers.len(),
        scored_at: context.scored_at,
        scores,
        risk,
        recommendation,
        confidence,
    }
}

/// Stateless evaluator that applies a scoring policy to answer sets.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    policy: ScoringPolicy,
}

impl ScoringEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn score(&self, answers: &[Answer], context: ScoringContext) -> ScoredResult {
        score(answers, context, &self.policy)
    }
}
