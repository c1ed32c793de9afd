use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Answer, QuestionId, SessionId};
use super::scoring::ScoredResult;

/// Lifecycle state of a questionnaire session.
///
/// `InProgress` may move to `Complete` (all questions answered) or `Expired` (TTL elapsed
/// first). `Expired` is terminal; `Complete` still accepts a result attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    InProgress,
    Complete,
    Expired,
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Complete => "complete",
            SessionStatus::Expired => "expired",
        }
    }
}

/// Answered/total projection of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent_complete(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let percent = (self.answered as f64 * 100.0 / self.total as f64).round();
        percent.clamp(0.0, 100.0) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.answered >= self.total
    }
}

/// One decision in progress. Only the session store mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub total_question_count: usize,
    pub answers: Vec<Answer>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub result: Option<ScoredResult>,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        title: String,
        total_question_count: usize,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id,
            title,
            total_question_count,
            answers: Vec::new(),
            status: SessionStatus::InProgress,
            started_at: now,
            updated_at: now,
            expires_at: now + ttl,
            result: None,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answers.len(),
            total: self.total_question_count,
        }
    }

    pub fn answer_for(&self, question_id: &QuestionId) -> Option<&Answer> {
        self.answers
            .iter()
            .find(|answer| &answer.question_id == question_id)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            decision_title: self.title.clone(),
            status: self.status,
            progress: self.progress(),
            started_at: self.started_at,
            updated_at: self.updated_at,
            expires_at: self.expires_at,
            has_result: self.result.is_some(),
        }
    }

    /// Flip an overdue in-progress session to `Expired`. Returns true on transition.
    pub(crate) fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == SessionStatus::InProgress && now >= self.expires_at {
            self.status = SessionStatus::Expired;
            self.updated_at = now;
            return true;
        }
        false
    }

    /// Insert or replace the answer for its question.
    pub(crate) fn upsert_answer(
        &mut self,
        answer: Answer,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if self.status == SessionStatus::Expired {
            return Err(SessionError::Expired(self.id.clone()));
        }

        let position = self
            .answers
            .iter()
            .position(|existing| existing.question_id == answer.question_id);

        match position {
            Some(index) => {
                if self.result.is_some() {
                    if self.answers[index].value == answer.value {
                        return Ok(());
                    }
                    return Err(SessionError::ResultLocked {
                        session_id: self.id.clone(),
                        question_id: answer.question_id,
                    });
                }
                self.answers[index] = answer;
            }
            None => {
                if self.answers.len() >= self.total_question_count {
                    return Err(SessionError::CapacityExceeded {
                        session_id: self.id.clone(),
                        total: self.total_question_count,
                    });
                }
                self.answers.push(answer);
            }
        }

        self.updated_at = now;
        if self.answers.len() >= self.total_question_count {
            self.status = SessionStatus::Complete;
        }
        Ok(())
    }

    /// Store a scored result. The first attached result wins and is never replaced.
    ///
    /// Returns true when this call stored `result`, false when an earlier one was kept.
    pub(crate) fn attach_result(
        &mut self,
        result: ScoredResult,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionError> {
        if self.status == SessionStatus::Expired {
            return Err(SessionError::Expired(self.id.clone()));
        }
        if self.result.is_some() {
            return Ok(false);
        }

        self.result = Some(result);
        self.status = SessionStatus::Complete;
        self.updated_at = now;
        Ok(true)
    }
}

/// Sanitized session summary for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: SessionId,
    pub decision_title: String,
    pub status: SessionStatus,
    pub progress: Progress,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub has_result: bool,
}

/// Error enumeration for session lookups and mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("session {0} has expired")]
    Expired(SessionId),
    #[error("session {0} already exists")]
    Conflict(SessionId),
    #[error("session {session_id} already holds answers for all {total} questions")]
    CapacityExceeded { session_id: SessionId, total: usize },
    #[error("session {session_id} has been scored; answer to {question_id} can no longer change")]
    ResultLocked {
        session_id: SessionId,
        question_id: QuestionId,
    },
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
