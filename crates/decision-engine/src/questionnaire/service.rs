use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::catalog::QuestionCatalog;
use super::domain::{Question, QuestionId, SessionId};
use super::scoring::{ScoredResult, ScoringContext, ScoringEngine, ScoringPolicy};
use super::session::{Progress, SessionError, SessionStatus, SessionView};
use super::store::{Clock, SessionStore};

pub const MIN_TITLE_CHARS: usize = 2;
pub const MAX_TITLE_CHARS: usize = 120;

/// Service composing the question catalog, session store and scoring engine.
pub struct DecisionService<S> {
    catalog: Arc<QuestionCatalog>,
    store: Arc<S>,
    engine: Arc<ScoringEngine>,
    clock: Arc<dyn Clock>,
}

impl<S> DecisionService<S>
where
    S: SessionStore + 'static,
{
    pub fn new(
        store: Arc<S>,
        catalog: QuestionCatalog,
        policy: ScoringPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store,
            engine: Arc::new(ScoringEngine::new(policy)),
            clock,
        }
    }

    pub fn questions(&self) -> &[Question] {
        self.catalog.questions()
    }

    /// Open a new session for `title` covering the whole catalog.
    pub fn start(&self, title: &str) -> Result<StartedSession, DecisionServiceError> {
        let title = validate_title(title)?;
        let session = self
            .store
            .create(SessionId::generate(), title, self.catalog.len())?;

        Ok(StartedSession {
            session_id: session.id,
            decision_title: session.title,
            questions: self.catalog.questions().to_vec(),
            total_questions: session.total_question_count,
            started_at: session.started_at,
        })
    }

    /// Record (or replace) the answer to one question.
    pub fn submit_answer(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
        value: i64,
    ) -> Result<AnswerReceipt, DecisionServiceError> {
        let question = self
            .catalog
            .find(question_id)
            .ok_or_else(|| ValidationError::UnknownQuestion(question_id.clone()))?;
        let out_of_range = || ValidationError::ValueOutOfRange {
            question_id: question_id.clone(),
            value,
            expected: question.domain.describe(),
        };
        if !question.domain.accepts(value) {
            return Err(out_of_range().into());
        }
        let value = u8::try_from(value).map_err(|_| out_of_range())?;

        let session = self
            .store
            .add_answer(session_id, question.answer(value))?;
        let progress = session.progress();

        Ok(AnswerReceipt {
            session_id: session.id.clone(),
            progress: ProgressView::from(progress),
            next_question: self.catalog.next_unanswered(&session).cloned(),
            is_complete: progress.is_complete(),
        })
    }

    /// Score the session, returning the cached result when one was already attached.
    ///
    /// Complete sessions have their first result attached and reused thereafter. Incomplete
    /// sessions with at least one answer receive a provisional result that is not cached.
    pub fn result(&self, session_id: &SessionId) -> Result<ResultEnvelope, DecisionServiceError> {
        let session = self.store.get(session_id)?;

        if let Some(result) = session.result {
            debug!(session_id = %session_id, "serving cached result");
            return Ok(ResultEnvelope {
                result,
                cached: true,
            });
        }

        if session.answers.is_empty() {
            return Err(DecisionServiceError::NoAnswers(session_id.clone()));
        }

        let scored = self.engine.score(
            &session.answers,
            ScoringContext {
                session_id: session.id.clone(),
                decision_title: session.title.clone(),
                scored_at: self.clock.now(),
            },
        );

        if session.status != SessionStatus::Complete {
            info!(
                session_id = %session_id,
                answered = session.answers.len(),
                total = session.total_question_count,
                "scored incomplete session without caching"
            );
            return Ok(ResultEnvelope {
                result: scored,
                cached: false,
            });
        }

        let (stored, attached) = self.store.attach_result(session_id, scored)?;
        match stored.result {
            Some(result) => {
                if attached {
                    info!(
                        session_id = %session_id,
                        decision = result.recommendation.decision.label(),
                        confidence = result.confidence.score,
                        "decision scored"
                    );
                }
                Ok(ResultEnvelope {
                    result,
                    cached: !attached,
                })
            }
            None => Err(SessionError::Unavailable(format!(
                "result for session {session_id} was not retained"
            ))
            .into()),
        }
    }

    pub fn progress(&self, session_id: &SessionId) -> Result<ProgressView, DecisionServiceError> {
        Ok(ProgressView::from(self.store.progress(session_id)?))
    }

    pub fn session(&self, session_id: &SessionId) -> Result<SessionView, DecisionServiceError> {
        Ok(self.store.get(session_id)?.view())
    }

    pub fn evict(&self, session_id: &SessionId) -> Result<SessionView, DecisionServiceError> {
        Ok(self.store.evict(session_id)?.view())
    }

    pub fn purge_expired(&self) -> Result<usize, DecisionServiceError> {
        Ok(self.store.purge_expired()?)
    }
}

fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    let length = title.chars().count();
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&length) {
        return Err(ValidationError::TitleLength { length });
    }
    Ok(title.to_string())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedSession {
    pub session_id: SessionId,
    pub decision_title: String,
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub answered: usize,
    pub total: usize,
    pub percent_complete: u8,
}

impl From<Progress> for ProgressView {
    fn from(progress: Progress) -> Self {
        Self {
            answered: progress.answered,
            total: progress.total,
            percent_complete: progress.percent_complete(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReceipt {
    pub session_id: SessionId,
    pub progress: ProgressView,
    pub next_question: Option<Question>,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub result: ScoredResult,
    pub cached: bool,
}

/// Malformed or out-of-range input rejected before it reaches the core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(
        "decision title must be between {} and {} characters (got {length})",
        MIN_TITLE_CHARS,
        MAX_TITLE_CHARS
    )]
    TitleLength { length: usize },
    #[error("unknown question '{0}'")]
    UnknownQuestion(QuestionId),
    #[error("value {value} is not accepted for question '{question_id}' (expected {expected})")]
    ValueOutOfRange {
        question_id: QuestionId,
        value: i64,
        expected: String,
    },
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Error raised by the decision service.
#[derive(Debug, thiserror::Error)]
pub enum DecisionServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("session {0} has no answers yet")]
    NoAnswers(SessionId),
}
