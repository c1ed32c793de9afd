use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for questionnaire sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for catalog questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scoring dimension a question contributes to.
///
/// Labels are case-insensitive on input and always lowercase on output. Anything outside the
/// five registered dimensions is carried as [`Category::Other`] so catalog changes degrade
/// gracefully instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Feasibility,
    Risk,
    Impact,
    Resources,
    Urgency,
    Other(String),
}

impl Category {
    pub const REGISTERED: [Category; 5] = [
        Category::Feasibility,
        Category::Risk,
        Category::Impact,
        Category::Resources,
        Category::Urgency,
    ];

    /// Parse a raw label, returning `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let category = match normalized.as_str() {
            "" => return None,
            "feasibility" => Self::Feasibility,
            "risk" => Self::Risk,
            "impact" => Self::Impact,
            "resources" => Self::Resources,
            "urgency" => Self::Urgency,
            _ => Self::Other(normalized),
        };
        Some(category)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Feasibility => "feasibility",
            Self::Risk => "risk",
            Self::Impact => "impact",
            Self::Resources => "resources",
            Self::Urgency => "urgency",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| "category label must not be blank".to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

/// Labelled option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: u8,
}

/// Accepted answer values for a question. Usable values always fall within 1–10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValueDomain {
    Scale { min: u8, max: u8 },
    Choice { options: Vec<ChoiceOption> },
}

impl ValueDomain {
    pub const MIN_VALUE: i64 = 1;
    pub const MAX_VALUE: i64 = 10;

    pub fn accepts(&self, value: i64) -> bool {
        if !(Self::MIN_VALUE..=Self::MAX_VALUE).contains(&value) {
            return false;
        }

        match self {
            Self::Scale { min, max } => (i64::from(*min)..=i64::from(*max)).contains(&value),
            Self::Choice { options } => options
                .iter()
                .any(|option| i64::from(option.value) == value),
        }
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        let in_range = |value: u8| (Self::MIN_VALUE..=Self::MAX_VALUE).contains(&i64::from(value));
        match self {
            Self::Scale { min, max } => in_range(*min) && in_range(*max) && min <= max,
            Self::Choice { options } => {
                !options.is_empty() && options.iter().all(|option| in_range(option.value))
            }
        }
    }

    /// Human-readable summary of the accepted values, e.g. `1-10` or `one of 2, 5, 8`.
    pub fn describe(&self) -> String {
        match self {
            Self::Scale { min, max } => format!("{min}-{max}"),
            Self::Choice { options } => {
                let values: Vec<String> = options
                    .iter()
                    .map(|option| option.value.to_string())
                    .collect();
                format!("one of {}", values.join(", "))
            }
        }
    }
}

/// Immutable question definition sourced from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub category: Category,
    pub weight: f64,
    #[serde(flatten)]
    pub domain: ValueDomain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Question {
    /// Build the answer record for this question, carrying its category and weight.
    pub fn answer(&self, value: u8) -> Answer {
        Answer {
            question_id: self.id.clone(),
            value,
            category: Some(self.category.clone()),
            weight: Some(self.weight),
        }
    }
}

/// A single recorded answer. One exists per question within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: QuestionId,
    pub value: u8,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub weight: Option<f64>,
}
