use serde::{Deserialize, Serialize};

use crate::questionnaire::domain::Category;

use super::{ScoreSet, ScoringPolicy};

const HIGH_RISK_THRESHOLD: u8 = 35;
const WEAK_DIMENSION_THRESHOLD: u8 = 40;
const COMBO_EXPOSURE_THRESHOLD: u8 = 50;

/// Exposure assumed when the risk category was never answered.
const NEUTRAL_EXPOSURE: u8 = 0;
/// Score assumed for feasibility/resources (and combo partners) when unanswered.
const NEUTRAL_CAPACITY: u8 = 100;

/// Ordinal risk classification. Only ever escalated during one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn escalate(self, to: Severity) -> Severity {
        self.max(to)
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, Severity::Low | Severity::Medium)
    }

    /// Points subtracted from the opportunity score at this severity.
    pub fn penalty(&self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 8,
            Severity::High => 20,
            Severity::Critical => 35,
        }
    }
}

/// Blocking findings raised by the risk analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFlag {
    HighRisk,
    CriticalCombo {
        primary: Category,
        secondary: Category,
    },
}

impl RiskFlag {
    pub fn message(&self) -> String {
        match self {
            RiskFlag::HighRisk => "risk exposure is high".to_string(),
            RiskFlag::CriticalCombo { primary, secondary } => {
                format!("critical combination: high {primary} exposure with weak {secondary}")
            }
        }
    }
}

/// Non-blocking findings raised by the risk analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskWarning {
    LowFeasibility,
    ResourceConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskReport {
    pub severity: Severity,
    pub effective_risk_score: u8,
    pub flags: Vec<RiskFlag>,
    pub warnings: Vec<RiskWarning>,
    pub safe: bool,
}

/// Stage 3: classify risk from normalized scores.
///
/// Risk answers measure safety, so the normalized risk score is inverted into an exposure
/// score before any threshold applies.
pub fn assess_risk(scores: &ScoreSet, policy: &ScoringPolicy) -> RiskReport {
    let effective_risk = scores
        .get(&Category::Risk)
        .map(|safety| 100 - safety.min(100))
        .unwrap_or(NEUTRAL_EXPOSURE);
    let feasibility = scores.get_or(&Category::Feasibility, NEUTRAL_CAPACITY);
    let resources = scores.get_or(&Category::Resources, NEUTRAL_CAPACITY);

    let mut severity = Severity::Low;
    let mut flags = Vec::new();
    let mut warnings = Vec::new();

    if effective_risk >= HIGH_RISK_THRESHOLD {
        flags.push(RiskFlag::HighRisk);
        severity = severity.escalate(Severity::High);
    }

    if feasibility < WEAK_DIMENSION_THRESHOLD {
        warnings.push(RiskWarning::LowFeasibility);
        severity = severity.escalate(Severity::Medium);
    }

    if resources < WEAK_DIMENSION_THRESHOLD {
        warnings.push(RiskWarning::ResourceConstraint);
        severity = severity.escalate(Severity::Medium);
    }

    let resolve = |category: &Category| {
        if *category == Category::Risk {
            effective_risk
        } else {
            scores.get_or(category, NEUTRAL_CAPACITY)
        }
    };

    for (primary, secondary) in &policy.critical_pairs {
        if resolve(primary) >= COMBO_EXPOSURE_THRESHOLD
            && resolve(secondary) < WEAK_DIMENSION_THRESHOLD
        {
            flags.push(RiskFlag::CriticalCombo {
                primary: primary.clone(),
                secondary: secondary.clone(),
            });
            severity = Severity::Critical;
        }
    }

    RiskReport {
        severity,
        effective_risk_score: effective_risk,
        flags,
        warnings,
        safe: severity.is_safe(),
    }
}
