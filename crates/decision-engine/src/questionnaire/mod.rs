//! Guided decision questionnaire: catalog, session lifecycle, scoring and HTTP routing.
//!
//! A session is started for one decision, accumulates one answer per catalog question and
//! completes once every question is answered. Scoring runs through the five-stage pipeline
//! in [`scoring`] and the first result for a complete session is cached on it.

pub mod answer_sheet;
pub mod catalog;
pub mod domain;
pub mod router;
pub mod scoring;
pub mod service;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use answer_sheet::{parse_answer_sheet, read_answer_sheet, AnswerSheetEntry, AnswerSheetError};
pub use catalog::{CatalogError, QuestionCatalog};
pub use domain::{Answer, Category, ChoiceOption, Question, QuestionId, SessionId, ValueDomain};
pub use router::decision_router;
pub use scoring::{
    ConfidenceLabel, ConfidenceScore, Recommendation, RiskFlag, RiskReport, RiskWarning,
    ScoreSet, ScoredResult, ScoringContext, ScoringEngine, ScoringPolicy, Severity, Verdict,
};
pub use service::{
    AnswerReceipt, DecisionService, DecisionServiceError, ProgressView, ResultEnvelope,
    StartedSession, ValidationError,
};
pub use session::{Progress, Session, SessionError, SessionStatus, SessionView};
pub use store::{Clock, InMemorySessionStore, SessionStore, SystemClock};
