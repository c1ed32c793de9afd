use serde::{Deserialize, Serialize};

use crate::questionnaire::domain::Category;

use super::risk::{RiskReport, Severity};
use super::ScoreSet;

const NEUTRAL_SCORE: u8 = 50;

const OPPORTUNITY_BLEND: [(Category, f64); 4] = [
    (Category::Impact, 0.4),
    (Category::Feasibility, 0.3),
    (Category::Resources, 0.2),
    (Category::Urgency, 0.1),
];

pub(crate) const RISK_BLOCK_RATIONALE: &str =
    "Critical risk factors block this decision regardless of its opportunity score.";
const RISK_BLOCK_ACTION: &str =
    "Resolve the flagged risk combinations before revisiting this decision.";
const PROCEED_RATIONALE: &str =
    "Strong opportunity with manageable risk supports moving forward.";
const PROCEED_ACTION: &str = "Commit resources and set milestones to track execution.";
const CAUTION_RATIONALE: &str =
    "The opportunity is solid but the risk-adjusted score leaves limited margin.";
const CAUTION_ACTION: &str =
    "Proceed in stages with explicit checkpoints and a fallback plan.";
const DEFER_RATIONALE: &str =
    "The risk-adjusted score is too uncertain to commit right now.";
const DEFER_ACTION: &str =
    "Gather more information on the weakest dimensions and reassess.";
pub(crate) const LOW_OPPORTUNITY_RATIONALE: &str =
    "The opportunity score is too low to justify the effort and exposure.";
const LOW_OPPORTUNITY_ACTION: &str =
    "Drop this option or rework it substantially before reconsidering.";

/// Final verdict of a scored decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "PROCEED")]
    Proceed,
    #[serde(rename = "PROCEED WITH CAUTION")]
    ProceedWithCaution,
    #[serde(rename = "DEFER")]
    Defer,
    #[serde(rename = "DO NOT PROCEED")]
    DoNotProceed,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Proceed => "PROCEED",
            Verdict::ProceedWithCaution => "PROCEED WITH CAUTION",
            Verdict::Defer => "DEFER",
            Verdict::DoNotProceed => "DO NOT PROCEED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub decision: Verdict,
    pub rationale: String,
    pub action: String,
    pub opportunity_score: u8,
    pub adjusted_score: u8,
}

/// Stage 4: blend normalized scores into an opportunity score, apply the severity penalty
/// and map the result to a verdict.
pub fn recommend(scores: &ScoreSet, risk: &RiskReport) -> Recommendation {
    let blended: f64 = OPPORTUNITY_BLEND
        .iter()
        .map(|(category, weight)| f64::from(scores.get_or(category, NEUTRAL_SCORE)) * weight)
        .sum();
    let opportunity = blended.clamp(0.0, 100.0).round() as u8;
    let adjusted = opportunity.saturating_sub(risk.severity.penalty());

    let (decision, rationale, action) = if risk.severity == Severity::Critical {
        (Verdict::DoNotProceed, RISK_BLOCK_RATIONALE, RISK_BLOCK_ACTION)
    } else if adjusted >= 75 {
        (Verdict::Proceed, PROCEED_RATIONALE, PROCEED_ACTION)
    } else if adjusted >= 55 {
        (
            Verdict::ProceedWithCaution,
            CAUTION_RATIONALE,
            CAUTION_ACTION,
        )
    } else if adjusted >= 35 {
        (Verdict::Defer, DEFER_RATIONALE, DEFER_ACTION)
    } else {
        (
            Verdict::DoNotProceed,
            LOW_OPPORTUNITY_RATIONALE,
            LOW_OPPORTUNITY_ACTION,
        )
    };

    Recommendation {
        decision,
        rationale: rationale.to_string(),
        action: action.to_string(),
        opportunity_score: opportunity,
        adjusted_score: adjusted,
    }
}
