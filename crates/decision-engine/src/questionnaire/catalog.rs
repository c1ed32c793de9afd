use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use super::domain::{Category, ChoiceOption, Question, QuestionId, ValueDomain};
use super::session::Session;

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Empty,
    DuplicateQuestion(QuestionId),
    InvalidWeight { question_id: QuestionId, weight: f64 },
    InvalidDomain(QuestionId),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "failed to read question catalog: {}", err),
            CatalogError::Json(err) => write!(f, "invalid question catalog JSON: {}", err),
            CatalogError::Empty => write!(f, "question catalog contains no questions"),
            CatalogError::DuplicateQuestion(id) => {
                write!(f, "question '{}' appears more than once", id)
            }
            CatalogError::InvalidWeight {
                question_id,
                weight,
            } => write!(
                f,
                "question '{}' has non-positive weight {}",
                question_id, weight
            ),
            CatalogError::InvalidDomain(id) => write!(
                f,
                "question '{}' must accept values within {}-{}",
                id,
                ValueDomain::MIN_VALUE,
                ValueDomain::MAX_VALUE
            ),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Ordered, read-only list of question definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id.clone()) {
                return Err(CatalogError::DuplicateQuestion(question.id.clone()));
            }
            if !(question.weight.is_finite() && question.weight > 0.0) {
                return Err(CatalogError::InvalidWeight {
                    question_id: question.id.clone(),
                    weight: question.weight,
                });
            }
            if !question.domain.is_well_formed() {
                return Err(CatalogError::InvalidDomain(question.id.clone()));
            }
        }

        Ok(Self { questions })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let questions: Vec<Question> = serde_json::from_reader(reader)?;
        Self::from_questions(questions)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn find(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }

    /// First question, in catalog order, the session has not answered yet.
    pub fn next_unanswered(&self, session: &Session) -> Option<&Question> {
        self.questions
            .iter()
            .find(|question| session.answer_for(&question.id).is_none())
    }

    /// The built-in ten-question catalog, two questions per category.
    ///
    /// Risk questions are phrased so that a high value means the decision is safe.
    pub fn standard() -> Self {
        Self {
            questions: vec![
                scale(
                    "feasibility-capability",
                    "How confident are you that the team has the skills to execute this?",
                    Category::Feasibility,
                    1.5,
                    Some("1 = no relevant experience, 10 = done this many times"),
                ),
                choice(
                    "feasibility-dependencies",
                    "How many external dependencies must line up for this to work?",
                    Category::Feasibility,
                    1.0,
                    &[
                        ("Many, mostly uncertain", 2),
                        ("A few, mostly known", 5),
                        ("One or two, reliable", 8),
                        ("None", 10),
                    ],
                ),
                scale(
                    "risk-reversibility",
                    "If this goes wrong, how easily can it be undone?",
                    Category::Risk,
                    2.0,
                    Some("1 = irreversible, 10 = trivially reversible"),
                ),
                choice(
                    "risk-downside",
                    "What is the worst realistic outcome?",
                    Category::Risk,
                    1.5,
                    &[
                        ("Existential for the organisation", 1),
                        ("Serious but survivable loss", 4),
                        ("Noticeable setback", 7),
                        ("Minor inconvenience", 10),
                    ],
                ),
                scale(
                    "impact-value",
                    "How much value does this create if it succeeds?",
                    Category::Impact,
                    2.0,
                    None,
                ),
                choice(
                    "impact-reach",
                    "Who benefits from the outcome?",
                    Category::Impact,
                    1.0,
                    &[
                        ("Only me", 3),
                        ("My team", 5),
                        ("The whole organisation", 8),
                        ("Customers and the organisation", 10),
                    ],
                ),
                scale(
                    "resources-budget",
                    "How well does the available budget cover the expected cost?",
                    Category::Resources,
                    1.5,
                    Some("1 = far short, 10 = fully funded with reserve"),
                ),
                scale(
                    "resources-capacity",
                    "How much people time can realistically be committed?",
                    Category::Resources,
                    1.0,
                    None,
                ),
                choice(
                    "urgency-window",
                    "How soon does the opportunity close?",
                    Category::Urgency,
                    1.0,
                    &[
                        ("No deadline", 2),
                        ("Within a year", 5),
                        ("Within a quarter", 8),
                        ("Within weeks", 10),
                    ],
                ),
                scale(
                    "urgency-cost-of-delay",
                    "How costly is waiting another month?",
                    Category::Urgency,
                    0.5,
                    None,
                ),
            ],
        }
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn scale(id: &str, text: &str, category: Category, weight: f64, hint: Option<&str>) -> Question {
    Question {
        id: QuestionId::new(id),
        text: text.to_string(),
        category,
        weight,
        domain: ValueDomain::Scale { min: 1, max: 10 },
        hint: hint.map(str::to_string),
    }
}

fn choice(
    id: &str,
    text: &str,
    category: Category,
    weight: f64,
    options: &[(&str, u8)],
) -> Question {
    Question {
        id: QuestionId::new(id),
        text: text.to_string(),
        category,
        weight,
        domain: ValueDomain::Choice {
            options: options
                .iter()
                .map(|(label, value)| ChoiceOption {
                    label: label.to_string(),
                    value: *value,
                })
                .collect(),
        },
        hint: None,
    }
}
